use std::fmt::Display;

use bs_core::ScriptError;

use crate::json_line;

fn map_error(code: &'static str, error: impl Display) -> ScriptError {
    ScriptError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ScriptError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    if let Some(node_id) = &error.node_id {
        println!("ERROR_NODE:{}", node_id);
    }
    println!("ERROR_MSG_JSON:{}", json_line(&error.message));
    1
}

pub(crate) fn map_line_io(error: std::io::Error) -> ScriptError {
    map_error("LINE_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> ScriptError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> ScriptError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> ScriptError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> ScriptError {
    map_error("CLI_STATE_INVALID", error)
}
