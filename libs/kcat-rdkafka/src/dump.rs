use std::ffi::{CStr, CString, c_char};
use std::io::Write;

use kcat_api::{ClientError, ClientProperties};
use rdkafka::bindings as rdsys;
use rdkafka::types::RDKafkaConfRes;

const ERRSTR_LEN: usize = 512;

/// Native librdkafka configuration object, global or topic scope.
enum NativeConf {
    Global(*mut rdsys::rd_kafka_conf_t),
    Topic(*mut rdsys::rd_kafka_topic_conf_t),
}

impl NativeConf {
    fn global() -> Self {
        NativeConf::Global(unsafe { rdsys::rd_kafka_conf_new() })
    }

    fn topic() -> Self {
        NativeConf::Topic(unsafe { rdsys::rd_kafka_topic_conf_new() })
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), ClientError> {
        let c_name = CString::new(name)
            .map_err(|_| ClientError::config(format!("property name contains a NUL byte: {name:?}")))?;
        let c_value = CString::new(value)
            .map_err(|_| ClientError::config(format!("value of {name} contains a NUL byte")))?;
        let mut errstr: [c_char; ERRSTR_LEN] = [0; ERRSTR_LEN];

        let res = match *self {
            NativeConf::Global(conf) => unsafe {
                rdsys::rd_kafka_conf_set(conf, c_name.as_ptr(), c_value.as_ptr(), errstr.as_mut_ptr(), ERRSTR_LEN)
            },
            NativeConf::Topic(conf) => unsafe {
                rdsys::rd_kafka_topic_conf_set(conf, c_name.as_ptr(), c_value.as_ptr(), errstr.as_mut_ptr(), ERRSTR_LEN)
            },
        };
        if res == RDKafkaConfRes::RD_KAFKA_CONF_OK {
            return Ok(());
        }

        let reason = unsafe { CStr::from_ptr(errstr.as_ptr()) }.to_string_lossy().into_owned();
        Err(ClientError::config(reason))
    }

    /// Every property with its current value, defaults included.
    fn entries(&self) -> Vec<(String, String)> {
        let mut cnt: usize = 0;
        let arr = match *self {
            NativeConf::Global(conf) => unsafe { rdsys::rd_kafka_conf_dump(conf, &mut cnt) },
            NativeConf::Topic(conf) => unsafe { rdsys::rd_kafka_topic_conf_dump(conf, &mut cnt) },
        };
        if arr.is_null() {
            return Vec::new();
        }

        let items = unsafe { std::slice::from_raw_parts(arr.cast_const(), cnt) };
        let entries = items
            .chunks_exact(2)
            .map(|pair| (native_str(pair[0]), native_str(pair[1])))
            .collect();
        unsafe { rdsys::rd_kafka_conf_dump_free(arr, cnt) };
        entries
    }
}

impl Drop for NativeConf {
    fn drop(&mut self) {
        match *self {
            NativeConf::Global(conf) => unsafe { rdsys::rd_kafka_conf_destroy(conf) },
            NativeConf::Topic(conf) => unsafe { rdsys::rd_kafka_topic_conf_destroy(conf) },
        }
    }
}

fn native_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Write librdkafka's effective configuration for `props`, defaults
/// included, as `# Global config` and `# Topic config` sections.
///
/// Fails with a config error when librdkafka rejects a property.
pub fn dump_config<W: Write>(props: &ClientProperties, out: &mut W) -> Result<(), ClientError> {
    let mut global = NativeConf::global();
    for (name, value) in props.global() {
        global.set(name, value)?;
    }
    let mut topic = NativeConf::topic();
    for (name, value) in props.topic() {
        topic.set(name, value)?;
    }

    for (title, conf) in [("Global", &global), ("Topic", &topic)] {
        write_section(out, title, &conf.entries())
            .map_err(|e| ClientError::config(format!("failed to write configuration: {e}")))?;
    }
    Ok(())
}

fn write_section<W: Write>(out: &mut W, title: &str, entries: &[(String, String)]) -> std::io::Result<()> {
    writeln!(out, "# {title} config")?;
    for (name, value) in entries {
        writeln!(out, "{name} = {value}")?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kcat_api::ErrorKind;

    fn dump(props: &ClientProperties) -> Result<String, ClientError> {
        let mut out = Vec::new();
        dump_config(props, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn dump_includes_explicit_and_default_properties() {
        let mut props = ClientProperties::new();
        props.set("client.id", "kcat-dump").set("topic.message.timeout.ms", "12345");

        let text = dump(&props).unwrap();
        let (global, topic) = text.split_once("# Topic config\n").unwrap();

        assert!(global.starts_with("# Global config\n"));
        assert!(global.lines().any(|l| l == "client.id = kcat-dump"));
        // a librdkafka default nobody set
        assert!(global.lines().any(|l| l.starts_with("message.max.bytes = ")));
        assert!(global.ends_with("\n\n"));

        assert!(topic.lines().any(|l| l == "message.timeout.ms = 12345"));
        assert!(topic.ends_with("\n\n"));
    }

    #[test]
    fn unknown_property_is_a_config_error() {
        let mut props = ClientProperties::new();
        props.set("no.such.property", "1");

        let err = dump(&props).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("no.such.property"), "{}", err.message());
    }
}
