//! One handler per command. Each returns the `result` payload on success.

mod macros;
mod report;
mod view;

use macrobridge_syntax::MacroName;
use serde_json::Value;

use crate::context::ServerContext;

use super::errors::DispatchError;
use super::request::{CommandKind, CommandRequest};

pub(super) fn route(
    context: &ServerContext,
    kind: CommandKind,
    request: &CommandRequest,
) -> Result<Value, DispatchError> {
    match kind {
        CommandKind::CreateMacro => macros::create(context, request),
        CommandKind::UpdateMacro => macros::update(context, request),
        CommandKind::RunMacro => macros::run(context, request),
        CommandKind::ValidateMacroCode => macros::validate(context, request),
        CommandKind::SetView => view::set_view(context, request),
        CommandKind::GetReport => report::get_report(context, request),
    }
}

/// Rejects code with syntax issues before anything reaches the host.
fn check_syntax(context: &ServerContext, code: &str) -> Result<(), DispatchError> {
    let issues = context.validator.validate(code)?;
    if issues.is_empty() {
        Ok(())
    } else {
        Err(DispatchError::validation(issues))
    }
}

fn macro_name(raw: &str) -> Result<MacroName, DispatchError> {
    Ok(MacroName::parse(raw)?)
}
