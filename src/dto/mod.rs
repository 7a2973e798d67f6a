pub mod mcq_dto;
