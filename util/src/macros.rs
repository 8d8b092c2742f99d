/// Print to stderr before tracing is up.
#[macro_export]
macro_rules! bootstrap {
    ($x:expr $( , $xs:expr )* $(,)?) => {
        eprintln!(concat!("[bootstrap] ", $x) $( , $xs )*)
    };
}

/// Log the error in a `Result` and carry on.
#[macro_export]
macro_rules! trace_catch {
    ($val:expr, $($rest:tt)*) => {
        if let Err(ref e) = $val {
            $crate::tracing::error!(error = %e, $($rest)*);
        }
    };
}

/// Like [`trace_catch`], but at `warn` and yielding the `Ok` value as an `Option`.
#[macro_export]
macro_rules! warn_catch {
    ($val:expr, $($rest:tt)*) => {
        match $val {
            Ok(v) => Some(v),
            Err(ref e) => {
                $crate::tracing::warn!(error = %e, $($rest)*);
                None
            },
        }
    };
}
