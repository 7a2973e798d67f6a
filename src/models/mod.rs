pub mod mcq;
