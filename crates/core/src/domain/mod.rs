pub mod article;
pub mod contract;
pub mod news;
pub mod rating;
pub mod snapshot;
