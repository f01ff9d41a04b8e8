use kcat_api::ClientProperties;
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use tracing::level_filters::LevelFilter;

/// Build a librdkafka configuration from passthrough properties.
///
/// librdkafka takes topic properties at the top level as defaults for
/// every topic handle, so both scopes end up in one `ClientConfig`.
pub fn client_config(props: &ClientProperties) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (name, value) in props.global() {
        config.set(name, value);
    }
    for (name, value) in props.topic() {
        config.set(name, value);
    }
    config.set_log_level(log_level_for(LevelFilter::current()));
    config
}

/// librdkafka log level matching the active tracing filter.
pub fn log_level_for(filter: LevelFilter) -> RDKafkaLogLevel {
    if filter >= LevelFilter::DEBUG {
        RDKafkaLogLevel::Debug
    } else if filter >= LevelFilter::INFO {
        RDKafkaLogLevel::Info
    } else if filter >= LevelFilter::WARN {
        RDKafkaLogLevel::Warning
    } else if filter >= LevelFilter::ERROR {
        RDKafkaLogLevel::Error
    } else {
        RDKafkaLogLevel::Emerg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_properties_lose_their_prefix() {
        let mut props = ClientProperties::new();
        props.set("bootstrap.servers", "b1:9092");
        props.set("topic.acks", "all");

        let config = client_config(&props);
        assert_eq!(config.get("bootstrap.servers"), Some("b1:9092"));
        assert_eq!(config.get("acks"), Some("all"));
        assert_eq!(config.get("topic.acks"), None);
    }

    #[test]
    fn log_levels() {
        assert!(matches!(log_level_for(LevelFilter::TRACE), RDKafkaLogLevel::Debug));
        assert!(matches!(log_level_for(LevelFilter::INFO), RDKafkaLogLevel::Info));
        assert!(matches!(log_level_for(LevelFilter::ERROR), RDKafkaLogLevel::Error));
        assert!(matches!(log_level_for(LevelFilter::OFF), RDKafkaLogLevel::Emerg));
    }
}
