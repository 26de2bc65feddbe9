use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    Date,
    /// A model score in [0, 1]; accepts tier labels on equality.
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    /// Indexable attribute on the constituent row.
    Direct(&'static str),
    /// Requires summarizing related gift or contact rows first.
    Aggregated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticField {
    pub name: &'static str,
    pub target: FieldTarget,
    pub kind: FieldKind,
}

impl SemanticField {
    pub const fn is_aggregated(&self) -> bool {
        matches!(self.target, FieldTarget::Aggregated)
    }

    /// Column for direct fields, semantic name for aggregated ones.
    pub const fn column(&self) -> &'static str {
        match self.target {
            FieldTarget::Direct(column) => column,
            FieldTarget::Aggregated => self.name,
        }
    }
}

const FIELDS: &[SemanticField] = &[
    SemanticField {
        name: "lapse_risk",
        target: FieldTarget::Direct("lapseRiskScore"),
        kind: FieldKind::Score,
    },
    SemanticField {
        name: "priority_score",
        target: FieldTarget::Direct("priorityScore"),
        kind: FieldKind::Score,
    },
    SemanticField {
        name: "capacity",
        target: FieldTarget::Direct("estimatedCapacity"),
        kind: FieldKind::Number,
    },
    SemanticField {
        name: "constituent_type",
        target: FieldTarget::Direct("constituentType"),
        kind: FieldKind::Text,
    },
    SemanticField {
        name: "assigned_officer",
        target: FieldTarget::Direct("assignedOfficerId"),
        kind: FieldKind::Text,
    },
    SemanticField {
        name: "class_year",
        target: FieldTarget::Direct("classYear"),
        kind: FieldKind::Number,
    },
    SemanticField {
        name: "school_college",
        target: FieldTarget::Direct("schoolCollege"),
        kind: FieldKind::Text,
    },
    SemanticField {
        name: "total_giving",
        target: FieldTarget::Aggregated,
        kind: FieldKind::Number,
    },
    SemanticField {
        name: "last_gift_date",
        target: FieldTarget::Aggregated,
        kind: FieldKind::Date,
    },
    SemanticField {
        name: "last_contact_date",
        target: FieldTarget::Aggregated,
        kind: FieldKind::Date,
    },
];

static FIELD_INDEX: OnceLock<HashMap<&'static str, &'static SemanticField>> = OnceLock::new();

fn field_index() -> &'static HashMap<&'static str, &'static SemanticField> {
    FIELD_INDEX.get_or_init(|| FIELDS.iter().map(|field| (field.name, field)).collect())
}

/// Case-insensitive lookup of a semantic field name.
pub fn lookup(raw: &str) -> Option<&'static SemanticField> {
    let normalized = raw.trim().to_ascii_lowercase();
    field_index().get(normalized.as_str()).copied()
}

pub fn fields() -> &'static [SemanticField] {
    FIELDS
}
