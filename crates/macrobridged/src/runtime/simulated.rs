//! In-memory host used by the stand-alone binary and the tests.
//!
//! The simulator understands a small line-oriented subset of macro code:
//! `addObject`, `removeObject`, `newDocument`, `recompute`, `time.sleep`,
//! `raise` and imports. Every other line is accepted without effect, except
//! that a dotted access through a name outside the namespace fails with a
//! `NameError`. Clones share state, so a test can keep a handle while the
//! original is moved onto the application thread.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use super::{ApplicationRuntime, ExecutionFailure, Namespace, RuntimeError, ViewKind};

/// Modules macro code may import.
const IMPORTABLE: [&str; 6] = ["FreeCAD", "FreeCADGui", "Part", "Sketcher", "math", "time"];

#[derive(Debug, Default)]
struct SimState {
    gui_up: bool,
    documents: BTreeMap<String, BTreeMap<String, String>>,
    active: Option<String>,
    camera: Option<ViewKind>,
    view_changes: usize,
    recomputes: usize,
    executions: usize,
}

impl SimState {
    fn unique_document_name(&self, base: &str) -> String {
        unique_name(base, |candidate| self.documents.contains_key(candidate))
    }

    fn document_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut BTreeMap<String, String>, RuntimeError> {
        self.documents
            .get_mut(name)
            .ok_or_else(|| RuntimeError::DocumentNotFound {
                name: name.to_owned(),
            })
    }
}

fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_owned();
    }
    (1_u32..)
        .map(|index| format!("{base}{index:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_owned())
}

/// Shared-state simulation of the host application.
#[derive(Debug, Clone)]
pub struct SimulatedRuntime {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRuntime {
    /// A runtime with the GUI up and no documents.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                gui_up: true,
                ..SimState::default()
            })),
        }
    }

    /// A runtime whose GUI never came up.
    #[must_use]
    pub fn headless() -> Self {
        let runtime = Self::new();
        runtime.lock().gui_up = false;
        runtime
    }

    /// Adds an empty document and makes it active.
    #[must_use]
    pub fn with_document(self, name: &str) -> Self {
        {
            let mut state = self.lock();
            state.documents.insert(name.to_owned(), BTreeMap::new());
            state.active = Some(name.to_owned());
        }
        self
    }

    /// Names of all open documents.
    #[must_use]
    pub fn documents(&self) -> Vec<String> {
        self.lock().documents.keys().cloned().collect()
    }

    /// Artifact names in `document`, empty if it does not exist.
    #[must_use]
    pub fn objects(&self, document: &str) -> Vec<String> {
        self.lock()
            .documents
            .get(document)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Current camera preset, if one was ever applied.
    #[must_use]
    pub fn camera(&self) -> Option<ViewKind> {
        self.lock().camera
    }

    /// Number of camera changes applied.
    #[must_use]
    pub fn view_changes(&self) -> usize {
        self.lock().view_changes
    }

    /// Number of recomputes requested.
    #[must_use]
    pub fn recomputes(&self) -> usize {
        self.lock().recomputes
    }

    /// Number of `execute` calls that reached the interpreter.
    #[must_use]
    pub fn executions(&self) -> usize {
        self.lock().executions
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ApplicationRuntime for SimulatedRuntime {
    fn gui_up(&self) -> bool {
        self.lock().gui_up
    }

    fn active_document(&self) -> Option<String> {
        self.lock().active.clone()
    }

    fn create_document(&mut self, name: &str) -> Result<String, RuntimeError> {
        let mut state = self.lock();
        let unique = state.unique_document_name(name);
        state.documents.insert(unique.clone(), BTreeMap::new());
        state.active = Some(unique.clone());
        Ok(unique)
    }

    fn open_document(&mut self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.lock();
        if !state.documents.contains_key(name) {
            return Err(RuntimeError::DocumentNotFound {
                name: name.to_owned(),
            });
        }
        state.active = Some(name.to_owned());
        Ok(())
    }

    fn close_document(&mut self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.lock();
        if state.documents.remove(name).is_none() {
            return Err(RuntimeError::DocumentNotFound {
                name: name.to_owned(),
            });
        }
        if state.active.as_deref() == Some(name) {
            state.active = state.documents.keys().next_back().cloned();
        }
        Ok(())
    }

    fn artifact_names(&self, document: &str) -> Result<BTreeSet<String>, RuntimeError> {
        self.lock()
            .documents
            .get(document)
            .map(|objects| objects.keys().cloned().collect())
            .ok_or_else(|| RuntimeError::DocumentNotFound {
                name: document.to_owned(),
            })
    }

    fn recompute(&mut self, document: &str) -> Result<(), RuntimeError> {
        let mut state = self.lock();
        state.document_mut(document)?;
        state.recomputes += 1;
        Ok(())
    }

    fn execute(&mut self, code: &str, namespace: &Namespace) -> Result<(), ExecutionFailure> {
        let document = namespace
            .document()
            .ok_or_else(|| ExecutionFailure::new("NameError: name 'doc' is not defined"))?
            .to_owned();
        self.lock().executions += 1;

        let mut interpreter = Interpreter {
            runtime: self,
            namespace,
            document,
            locals: BTreeSet::new(),
        };
        for (index, raw) in code.lines().enumerate() {
            interpreter
                .step(raw)
                .map_err(|message| failure_at(index + 1, raw, &message))?;
        }
        Ok(())
    }

    fn has_active_view(&self) -> bool {
        let state = self.lock();
        state.gui_up && state.active.is_some()
    }

    fn set_view(&mut self, kind: ViewKind) -> Result<(), RuntimeError> {
        let mut state = self.lock();
        if !state.gui_up {
            return Err(RuntimeError::GuiUnavailable);
        }
        if state.active.is_none() {
            return Err(RuntimeError::NoActiveView);
        }
        state.camera = Some(kind);
        state.view_changes += 1;
        Ok(())
    }
}

fn failure_at(line: usize, source: &str, message: &str) -> ExecutionFailure {
    let traceback = format!(
        "Traceback (most recent call last):\n  File \"<macro>\", line {line}, in <module>\n    {}\n{message}",
        source.trim()
    );
    ExecutionFailure::new(message).with_traceback(traceback)
}

/// Walks macro lines against the simulated host.
struct Interpreter<'a> {
    runtime: &'a SimulatedRuntime,
    namespace: &'a Namespace,
    document: String,
    locals: BTreeSet<String>,
}

impl Interpreter<'_> {
    fn step(&mut self, raw: &str) -> Result<(), String> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix("import ") {
            return self.import(rest);
        }
        if let Some(rest) = line.strip_prefix("raise") {
            return Err(raise_message(rest));
        }
        self.check_root(line)?;
        self.record_assignment(line);

        if let Some(args) = call_args(line, "newDocument(") {
            let base = string_literals(args).into_iter().next().unwrap_or_else(|| "Unnamed".to_owned());
            let mut state = self.runtime.lock();
            let unique = state.unique_document_name(&base);
            state.documents.insert(unique.clone(), BTreeMap::new());
            state.active = Some(unique);
            return Ok(());
        }
        if let Some(args) = call_args(line, "addObject(") {
            return self.add_object(line, args);
        }
        if let Some(args) = call_args(line, "removeObject(") {
            return self.remove_object(line, args);
        }
        if let Some(args) = call_args(line, "time.sleep(") {
            let seconds: f64 = args
                .trim()
                .parse()
                .map_err(|_| format!("TypeError: invalid sleep duration '{}'", args.trim()))?;
            let duration = Duration::try_from_secs_f64(seconds)
                .map_err(|_| "ValueError: sleep length must be non-negative".to_owned())?;
            thread::sleep(duration);
            return Ok(());
        }
        if line.contains("recompute()") {
            self.runtime.lock().recomputes += 1;
        }
        Ok(())
    }

    fn import(&mut self, rest: &str) -> Result<(), String> {
        for clause in rest.split(',') {
            let mut parts = clause.split_whitespace();
            let module = parts.next().unwrap_or_default();
            if !IMPORTABLE.contains(&module) {
                return Err(format!("ImportError: module '{module}' is not available"));
            }
            let alias = match (parts.next(), parts.next()) {
                (Some("as"), Some(alias)) => alias,
                _ => module,
            };
            self.locals.insert(alias.to_owned());
        }
        Ok(())
    }

    fn check_root(&self, line: &str) -> Result<(), String> {
        let Some(root) = dotted_root(line) else {
            return Ok(());
        };
        if self.namespace.contains(root) || self.locals.contains(root) {
            Ok(())
        } else {
            Err(format!("NameError: name '{root}' is not defined"))
        }
    }

    fn record_assignment(&mut self, line: &str) {
        let target = if let Some(rest) = line.strip_prefix("for ") {
            rest.split_whitespace().next()
        } else if let Some((lhs, rhs)) = line.split_once('=') {
            let is_comparison = rhs.starts_with('=') || lhs.ends_with(['!', '<', '>']);
            (!is_comparison).then(|| lhs.trim()).filter(|lhs| is_identifier(lhs))
        } else {
            None
        };
        if let Some(name) = target {
            self.locals.insert(name.to_owned());
        }
    }

    fn target_document(&self, line: &str) -> String {
        if line.contains("ActiveDocument.") {
            self.runtime
                .lock()
                .active
                .clone()
                .unwrap_or_else(|| self.document.clone())
        } else {
            self.document.clone()
        }
    }

    fn add_object(&self, line: &str, args: &str) -> Result<(), String> {
        let literals = string_literals(args);
        let mut literals = literals.into_iter();
        let Some(type_name) = literals.next() else {
            return Err("TypeError: addObject() needs a type name".to_owned());
        };
        let base = literals.next().unwrap_or_else(|| {
            type_name
                .rsplit("::")
                .next()
                .unwrap_or(type_name.as_str())
                .to_owned()
        });
        let target = self.target_document(line);
        let mut state = self.runtime.lock();
        let objects = state.document_mut(&target).map_err(|e| e.to_string())?;
        let name = unique_name(&base, |candidate| objects.contains_key(candidate));
        objects.insert(name, type_name);
        Ok(())
    }

    fn remove_object(&self, line: &str, args: &str) -> Result<(), String> {
        let Some(name) = string_literals(args).into_iter().next() else {
            return Err("TypeError: removeObject() needs an object name".to_owned());
        };
        let target = self.target_document(line);
        let mut state = self.runtime.lock();
        let objects = state.document_mut(&target).map_err(|e| e.to_string())?;
        if objects.remove(&name).is_none() {
            return Err(format!("ValueError: no object named '{name}'"));
        }
        Ok(())
    }
}

fn raise_message(rest: &str) -> String {
    let expr = rest.trim();
    if expr.is_empty() {
        return "RuntimeError: No active exception to reraise".to_owned();
    }
    match expr.split_once('(') {
        Some((kind, args)) => {
            let detail = string_literals(args).into_iter().next().unwrap_or_default();
            if detail.is_empty() {
                kind.trim().to_owned()
            } else {
                format!("{}: {detail}", kind.trim())
            }
        }
        None => expr.to_owned(),
    }
}

/// Text between `call` and its closing parenthesis.
fn call_args<'a>(line: &'a str, call: &str) -> Option<&'a str> {
    let start = line.find(call)? + call.len();
    let rest = line.get(start..)?;
    let mut quote = None;
    for (offset, ch) in rest.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, ')') => return rest.get(..offset),
            (None, _) => {}
        }
    }
    Some(rest)
}

/// Quoted string literals in order of appearance.
fn string_literals(args: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut current: Option<(char, String)> = None;
    for ch in args.chars() {
        current = match current.take() {
            Some((quote, text)) if ch == quote => {
                literals.push(text);
                None
            }
            Some((quote, mut text)) => {
                text.push(ch);
                Some((quote, text))
            }
            None if ch == '"' || ch == '\'' => Some((ch, String::new())),
            None => None,
        };
    }
    literals
}

/// Identifier at the start of `line` when it is immediately dereferenced.
fn dotted_root(line: &str) -> Option<&str> {
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let root = line.get(..end)?;
    let next = line.get(end..)?.chars().next();
    (next == Some('.') && is_identifier(root)).then_some(root)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
