use bucket2drive::Config;

pub fn is_progress_indicator_needed(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return true;
    };

    if log::Level::Warn < tracing_config.tracing_level {
        return false;
    }

    !tracing_config.json_tracing
}

pub fn is_show_result_needed(config: &Config) -> bool {
    config
        .tracing_config
        .as_ref()
        .is_none_or(|tracing_config| !tracing_config.json_tracing)
}

/// With JSON tracing the summary goes to the log instead of the terminal.
pub fn is_log_summary_needed(config: &Config) -> bool {
    config
        .tracing_config
        .as_ref()
        .is_some_and(|tracing_config| {
            tracing_config.json_tracing || log::Level::Info <= tracing_config.tracing_level
        })
}
