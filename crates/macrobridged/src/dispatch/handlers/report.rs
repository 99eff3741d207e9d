use serde_json::{Value, json};

use crate::context::ServerContext;
use crate::dispatch::errors::DispatchError;
use crate::dispatch::request::{CommandRequest, GetReportParams};

/// Returns the report text. Reading does not add a line of its own.
pub(super) fn get_report(context: &ServerContext, request: &CommandRequest) -> Result<Value, DispatchError> {
    let params: GetReportParams = request.params()?;
    let report = context.report.read_all();
    if params.clear {
        context.report.clear();
    }
    Ok(json!({ "report": report }))
}
