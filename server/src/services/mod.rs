pub mod fan_out;
pub mod prediction_client;
