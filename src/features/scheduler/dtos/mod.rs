mod scheduler_dto;

pub use scheduler_dto::*;
