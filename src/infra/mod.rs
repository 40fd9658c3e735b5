// Infrastructure: persisted artifacts

pub mod table_output;
