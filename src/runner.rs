use std::fmt::Display;

use log::{debug, error};

use crate::{CheckResult, Service, State};

/// Runs a check and turns its error into a state, so a broken section or bad parameters still
/// produce a line the monitoring host understands.
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> (State, E)>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> (State, E) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// This will run either the default `on_error` handler or the one specified by calling
    /// [Runner::on_error]. Without a handler errors are [State::Critical].
    pub fn safe_run(self, f: impl FnOnce() -> Result<Service, E>) -> RunnerResult<E> {
        match f() {
            Ok(service) => {
                debug!("check finished with state {}", service.state());
                RunnerResult::Ok(service)
            }
            Err(err) => {
                error!("check failed: {}", err);
                let (state, msg) = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or((State::Critical, err));

                RunnerResult::Err(state, msg)
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub enum RunnerResult<E> {
    Ok(Service),
    Err(State, E),
}

impl<E: Display> RunnerResult<E> {
    /// Folds an error into a service holding a single result with the error message.
    pub fn into_service(self, name: &str) -> Service {
        match self {
            RunnerResult::Ok(service) => service,
            RunnerResult::Err(state, msg) => {
                Service::new(name).with_result(CheckResult::new(state, msg.to_string()))
            }
        }
    }

    pub fn print_and_exit(self) -> ! {
        match self {
            RunnerResult::Ok(service) => service.print_and_exit(),
            RunnerResult::Err(state, msg) => {
                println!("{}: {}", state, msg);
                std::process::exit(state.exit_code());
            }
        }
    }
}

/// Runs the given closure and reports an error as a service in `error_state`.
pub fn safe_run<E: Display>(
    name: &str,
    f: impl FnOnce() -> Result<Service, E>,
    error_state: State,
) -> Service {
    Runner::<String>::new()
        .on_error(move |err| (error_state, err.clone()))
        .safe_run(|| f().map_err(|e| e.to_string()))
        .into_service(name)
}
