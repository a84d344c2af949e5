use env_logger::Env;

/// Installs the global logger. `RUST_LOG` wins when set; otherwise the level
/// is `info`, or `debug` with `verbose`.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(verbose)
        .init();
}
