use camino::Utf8Path;
use serde_json::{Value, json};

use crate::context::{SCRATCH_DOCUMENT, ServerContext};
use crate::dispatch::errors::DispatchError;
use crate::dispatch::request::{
    CommandRequest, CreateMacroParams, RunMacroParams, UpdateMacroParams, ValidateMacroParams,
};
use crate::executor::{execute_in_document, validate_in_scratch};

use super::{check_syntax, macro_name};

pub(super) fn create(context: &ServerContext, request: &CommandRequest) -> Result<Value, DispatchError> {
    let params: CreateMacroParams = request.params()?;
    let name = macro_name(&params.macro_name)?;
    let path = context.store.create(&name, params.template_type)?;
    context.report.append(format!(
        "Created macro '{name}' from the {} template at {path}",
        params.template_type
    ));
    Ok(json!({ "macro_path": path }))
}

pub(super) fn update(context: &ServerContext, request: &CommandRequest) -> Result<Value, DispatchError> {
    let params: UpdateMacroParams = request.params()?;
    let name = macro_name(&params.macro_name)?;
    let code = if params.normalize {
        context.normalizer.normalize(&params.code).code
    } else {
        params.code
    };
    check_syntax(context, &code)?;
    let path = context.store.update(&name, &code)?;
    context.report.append(format!("Updated macro '{name}' at {path}"));
    Ok(json!({ "macro_path": path }))
}

pub(super) fn run(context: &ServerContext, request: &CommandRequest) -> Result<Value, DispatchError> {
    let RunMacroParams {
        macro_path,
        macro_name: name,
        params,
        document,
    } = request.params()?;
    let path = match (macro_path, name) {
        (Some(path), None) => context.store.resolve(Utf8Path::new(&path))?,
        (None, Some(name)) => context.store.path_for(&macro_name(&name)?),
        _ => {
            return Err(DispatchError::invalid_params(
                "exactly one of macro_path or macro_name is required",
            ));
        }
    };
    let code = context.store.read_path(&path)?;
    check_syntax(context, &code)?;

    let default_document = context.default_document.clone();
    let outcome = context
        .bridge
        .submit("run_macro", context.execution_timeout, move |runtime| {
            execute_in_document(runtime, &code, params, &default_document, document.as_deref())
        })??;

    context.report.append(format!(
        "Ran macro {path} in '{}'; affected objects: [{}]",
        outcome.document,
        outcome.affected_objects.join(", ")
    ));
    Ok(serde_json::to_value(&outcome)?)
}

pub(super) fn validate(context: &ServerContext, request: &CommandRequest) -> Result<Value, DispatchError> {
    let ValidateMacroParams {
        macro_name: name,
        code,
        run_check,
    } = request.params()?;
    let (label, code) = match (name, code) {
        (Some(name), None) => {
            let name = macro_name(&name)?;
            let code = context.store.read(&name)?;
            (format!("macro '{name}'"), code)
        }
        (None, Some(code)) => ("inline code".to_owned(), code),
        _ => {
            return Err(DispatchError::invalid_params(
                "exactly one of macro_name or code is required",
            ));
        }
    };
    check_syntax(context, &code)?;

    let affected_objects = if run_check {
        context
            .bridge
            .submit("validate_macro_code", context.validation_timeout, move |runtime| {
                validate_in_scratch(runtime, &code, SCRATCH_DOCUMENT)
            })??
    } else {
        Vec::new()
    };

    context.report.append(format!(
        "Validated {label}: syntax ok{}",
        if run_check { ", run-check passed" } else { "" }
    ));
    Ok(json!({ "valid": true, "affected_objects": affected_objects }))
}
