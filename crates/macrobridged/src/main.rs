use std::process::ExitCode;

fn main() -> ExitCode {
    match macrobridged::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            macrobridged::report_launch_failure(&error);
            ExitCode::FAILURE
        }
    }
}
