use serde_json::{Value, json};

use crate::context::ServerContext;
use crate::dispatch::errors::DispatchError;
use crate::dispatch::request::{CommandRequest, SetViewParams};
use crate::executor::apply_view;
use crate::runtime::ViewKind;

pub(super) fn set_view(context: &ServerContext, request: &CommandRequest) -> Result<Value, DispatchError> {
    let params: SetViewParams = request.params()?;
    let code = params.code()?;
    let kind = ViewKind::from_code(&code).ok_or_else(|| {
        DispatchError::invalid_params(format!(
            "unknown view_type '{code}', expected one of 1 (front), 2 (top), 3 (right), 7 (isometric)"
        ))
    })?;
    let applied = context
        .bridge
        .submit("set_view", context.validation_timeout, move |runtime| {
            apply_view(runtime, kind)
        })??;
    context.report.append(format!("View set to {}", applied.name()));
    Ok(json!({ "view_name": applied.name() }))
}
