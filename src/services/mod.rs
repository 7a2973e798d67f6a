pub mod backend;
pub mod chunk_service;
pub mod extract_service;
pub mod gemini_client;
pub mod mcq_service;
pub mod ollama_client;
pub mod prompt_service;
pub mod response_validator;
pub mod selector_service;
