mod common;
mod portfolio;
mod query;
mod routing;
