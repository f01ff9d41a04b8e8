use std::borrow::Cow;
use std::io::{self, Write};

use kcat_api::Message;
use serde::Serialize;

use super::{CompiledFormat, Field, Token};

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Rendered for a null payload or key. `None` renders nothing.
    pub null_placeholder: Option<Vec<u8>>,
    /// Flush the sink after every message.
    pub unbuffered: bool,
    /// Write a JSON envelope before the formatted output.
    pub json: bool,
}

/// Executes a [`CompiledFormat`] against messages, writing straight to `out`.
pub struct Renderer<W> {
    format: CompiledFormat,
    out: W,
    options: RenderOptions,
}

#[derive(Serialize)]
struct Envelope<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
    key: Option<Cow<'a, str>>,
    payload: Option<Cow<'a, str>>,
}

impl<W: Write> Renderer<W> {
    pub fn new(format: CompiledFormat, out: W, options: RenderOptions) -> Self {
        Self { format, out, options }
    }

    pub fn render(&mut self, msg: &Message) -> io::Result<()> {
        let Self { format, out, options } = self;

        if options.json {
            let envelope = Envelope {
                topic: &msg.topic,
                partition: msg.partition,
                offset: msg.offset,
                key: msg.key.as_deref().map(String::from_utf8_lossy),
                payload: msg.payload.as_deref().map(String::from_utf8_lossy),
            };
            serde_json::to_writer(&mut *out, &envelope)?;
        }

        for token in format.tokens() {
            match token {
                Token::Literal(bytes) => out.write_all(bytes)?,
                Token::Field(field) => write_field(out, *field, msg, options)?,
            }
        }

        if options.unbuffered {
            out.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn write_field<W: Write>(out: &mut W, field: Field, msg: &Message, options: &RenderOptions) -> io::Result<()> {
    match field {
        Field::Payload => write_bytes(out, msg.payload.as_deref(), options),
        Field::Key => write_bytes(out, msg.key.as_deref(), options),
        Field::PayloadLen => write_len(out, msg.payload.as_deref()),
        Field::KeyLen => write_len(out, msg.key.as_deref()),
        Field::Topic => out.write_all(msg.topic.as_bytes()),
        Field::Partition => write!(out, "{}", msg.partition),
        Field::Offset => write!(out, "{}", msg.offset),
    }
}

fn write_bytes<W: Write>(out: &mut W, value: Option<&[u8]>, options: &RenderOptions) -> io::Result<()> {
    match (value, &options.null_placeholder) {
        (Some(bytes), _) => out.write_all(bytes),
        (None, Some(placeholder)) => out.write_all(placeholder),
        (None, None) => Ok(()),
    }
}

fn write_len<W: Write>(out: &mut W, value: Option<&[u8]>) -> io::Result<()> {
    match value {
        Some(bytes) => write!(out, "{}", bytes.len()),
        None => out.write_all(b"-1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(fmt: &str, msg: &Message, options: RenderOptions) -> String {
        let format = CompiledFormat::compile(fmt).unwrap();
        let mut renderer = Renderer::new(format, Vec::new(), options);
        renderer.render(msg).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn null_msg() -> Message {
        Message::new("x", 0, 0)
    }

    #[test]
    fn renders_every_field() {
        let msg = Message::new("x", 2, 5).with_key("k").with_payload("v");
        assert_eq!(
            render("%t[%p]@%o: %k=%s\\n", &msg, RenderOptions::default()),
            "x[2]@5: k=v\n"
        );
    }

    #[test]
    fn lengths() {
        let msg = Message::new("x", 0, 0).with_key("key").with_payload("hello");
        assert_eq!(render("%K %S", &msg, RenderOptions::default()), "3 5");
    }

    #[test]
    fn null_lengths_are_minus_one() {
        assert_eq!(render("%K %S", &null_msg(), RenderOptions::default()), "-1 -1");
    }

    #[test]
    fn null_values_render_nothing_by_default() {
        assert_eq!(render("[%k][%s]", &null_msg(), RenderOptions::default()), "[][]");
    }

    #[test]
    fn null_values_render_placeholder_when_enabled() {
        let options = RenderOptions {
            null_placeholder: Some(b"NULL".to_vec()),
            ..Default::default()
        };
        assert_eq!(render("[%k][%s]", &null_msg(), options.clone()), "[NULL][NULL]");

        // empty is not null
        let msg = Message::new("x", 0, 0).with_key("").with_payload("");
        assert_eq!(render("[%k][%s]", &msg, options), "[][]");
    }

    #[test]
    fn default_format_output() {
        let msg = Message::new("t", 0, 7).with_key("k").with_payload("v");
        let format = CompiledFormat::default_for("\\n", Some("\\t"), true).unwrap();
        let mut renderer = Renderer::new(format, Vec::new(), RenderOptions::default());
        renderer.render(&msg).unwrap();
        assert_eq!(renderer.get_ref().as_slice(), b"7\tk\tv\n");
    }

    #[test]
    fn json_envelope_precedes_format() {
        let msg = Message::new("t", 1, 3).with_payload("hi");
        let options = RenderOptions { json: true, ..Default::default() };
        assert_eq!(
            render("\\n", &msg, options),
            "{\"topic\":\"t\",\"partition\":1,\"offset\":3,\"key\":null,\"payload\":\"hi\"}\n"
        );
    }

    struct CountingSink {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn unbuffered_flushes_per_message() {
        let format = CompiledFormat::compile("%s\\n").unwrap();
        let sink = CountingSink { data: Vec::new(), flushes: 0 };
        let options = RenderOptions { unbuffered: true, ..Default::default() };
        let mut renderer = Renderer::new(format, sink, options);

        renderer.render(&Message::new("t", 0, 0).with_payload("a")).unwrap();
        renderer.render(&Message::new("t", 0, 1).with_payload("b")).unwrap();

        let sink = renderer.into_inner();
        assert_eq!(sink.data, b"a\nb\n");
        assert_eq!(sink.flushes, 2);
    }
}
