pub mod pipeline_logger;
pub mod sequence_result;
pub mod track_sequence_use_case;
