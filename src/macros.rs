macro_rules! impl_to_perf_string_on_to_string {
    ($($t:ty), *) => {
        $(
            impl ToPerfString for $t {
                fn to_perf_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

/// Lets you simply create an unnamed service from multiple check results. It's a bit like the
/// vec! macro.
/// ```rust
/// # #[macro_use]
/// # extern crate mk_plugins;
/// #
/// # use mk_plugins::{CheckResult, State};
/// #
/// # fn main() {
/// let r1 = CheckResult::new(State::Ok, "fine");
/// let r2 = CheckResult::new(State::Warning, "not so fine");
/// let service = service![r1, r2];
/// assert_eq!(service.state(), State::Warning);
/// # }
/// ```
#[macro_export]
macro_rules! service {
    ($( $r:expr ), *) => {
        {
            let mut s = $crate::Service::unnamed();
            $(
                s.push($r);
            )*
            s
        }
    };
}

macro_rules! perf_string {
    ($name:expr, $( $tps:expr), *) => {
        {
            let mut s = String::new();
            s.push_str(&format!("{}=", $name));
            $(
                s.push_str(&$tps.to_perf_string());
                s.push(';');
            )*
            s.trim_end_matches(';').to_string()
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{CheckResult, State};

    #[test]
    fn test_service_macro() {
        let r1 = CheckResult::new(State::Ok, "one");
        let r2 = r1.clone();

        let service = service![r1.clone()];
        assert_eq!(service.results().len(), 1);
        let service = service![r1.clone(), r2.clone()];
        assert_eq!(service.results().len(), 2);
        assert_eq!(service.name(), None);
    }
}
