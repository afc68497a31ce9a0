pub mod config_ops;
pub mod freq_ops;
pub mod merge_ops;

/// Print `$fmt` with the error appended and exit with status 1.
macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}

pub(crate) use die;
