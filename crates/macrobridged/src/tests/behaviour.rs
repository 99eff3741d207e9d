//! Behavioural tests for the server bootstrap sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::bootstrap::BootstrapError;

use super::support::{self, HealthEvent, TestConfigLoader, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_loader(TestConfigLoader::new());
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a configuration loader whose macro directory is blocked")]
fn given_blocked_macro_dir(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .use_loader(TestConfigLoader::new().with_blocked_macro_dir());
}

#[when("the server bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.error().is_none(),
        "bootstrap error: {:?}",
        world.error()
    );
    assert!(world.resources().is_some(), "resources should be prepared");
}

#[then("the macro directory exists")]
fn then_macro_dir_exists(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let loader = world.test_loader().expect("a test loader should be installed");
    assert!(loader.macro_dir().is_dir());
    let resources = world.resources().expect("resources should be prepared");
    assert_eq!(resources.store().root(), loader.macro_dir().as_path());
    assert_eq!(
        resources.report().mirror_path(),
        Some(loader.report_log_path().as_path())
    );
}

#[then("bootstrap fails with a configuration error")]
fn then_configuration_error(world: &RefCell<TestWorld>) {
    assert!(matches!(
        world.borrow().error(),
        Some(BootstrapError::Configuration { .. })
    ));
}

#[then("bootstrap fails with a macro directory error")]
fn then_macro_dir_error(world: &RefCell<TestWorld>) {
    assert!(matches!(
        world.borrow().error(),
        Some(BootstrapError::MacroDir { .. })
    ));
}

#[then("the health reporter saw bootstrap start then succeed")]
fn then_health_succeeded(world: &RefCell<TestWorld>) {
    assert_eq!(
        world.borrow().events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[then("the health reporter saw bootstrap start then fail")]
fn then_health_failed(world: &RefCell<TestWorld>) {
    let events = world.borrow().events();
    assert_eq!(events.len(), 2, "unexpected events: {events:?}");
    assert_eq!(events[0], HealthEvent::BootstrapStarting);
    assert!(matches!(events[1], HealthEvent::BootstrapFailed(_)));
}

#[scenario(
    path = "tests/features/server_bootstrap.feature",
    name = "Bootstrap prepares the macro directory"
)]
fn bootstrap_prepares_macro_dir(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/server_bootstrap.feature",
    name = "Bootstrap fails when configuration cannot load"
)]
fn bootstrap_fails_on_configuration(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/server_bootstrap.feature",
    name = "Bootstrap fails when the macro directory cannot be created"
)]
fn bootstrap_fails_on_macro_dir(world: RefCell<TestWorld>) {
    let _ = world;
}
