use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{Color, Encode, Style, Write};
use serde::Deserialize;
use std::io;

const DEFAULT_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} {t} - {m}";

#[derive(Debug, Deserialize)]
pub struct StructuredConsoleEncoderConfig {
    pub pattern: Option<String>,
    /// Values longer than this are cut and suffixed with `...`.
    pub max_value_len: Option<usize>,
}

/// Pattern encoder that appends the record's key/value pairs as `key=value`.
///
/// Values containing whitespace are quoted so that the line stays parseable.
#[derive(Debug)]
pub struct StructuredConsoleEncoder {
    delegate: PatternEncoder,
    max_value_len: Option<usize>,
}

impl StructuredConsoleEncoder {
    pub fn new(pattern: &str, max_value_len: Option<usize>) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
            max_value_len,
        }
    }
}

impl Encode for StructuredConsoleEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut visitor = PairWriter {
            writer: w,
            max_value_len: self.max_value_len,
            io_err: None,
        };

        if let Err(kv_err) = record.key_values().visit(&mut visitor) {
            if let Some(io_err) = visitor.io_err {
                return Err(io_err.into());
            }
            write!(w, " [KV Error: {}]", kv_err)?;
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

/// Renders one value the way it appears after `key=`.
pub fn render_value(value: &str, max_len: Option<usize>) -> String {
    let mut rendered: String = match max_len {
        Some(max) if value.chars().count() > max => {
            let mut cut: String = value.chars().take(max).collect();
            cut.push_str("...");
            cut
        },
        _ => value.to_string(),
    };
    if rendered.chars().any(char::is_whitespace) {
        rendered = format!("{:?}", rendered);
    }
    rendered
}

struct PairWriter<'a> {
    writer: &'a mut dyn Write,
    max_value_len: Option<usize>,
    io_err: Option<io::Error>,
}

impl<'kvs> VisitSource<'kvs> for PairWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        let rendered = render_value(&value.to_string(), self.max_value_len);
        let result = (|| {
            self.writer.set_style(Style::new().text(Color::Cyan))?;
            write!(self.writer, " {}=", key)?;

            self.writer.set_style(&Style::default())?;
            write!(self.writer, "{}", rendered)?;
            Ok::<(), io::Error>(())
        })();

        if let Err(e) = result {
            self.io_err = Some(e);
            return Err(Error::msg("io error during visit"));
        }

        Ok(())
    }
}

pub struct StructuredConsoleEncoderDeserializer;

impl log4rs::config::Deserialize for StructuredConsoleEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = StructuredConsoleEncoderConfig;

    fn deserialize(
        &self,
        config: StructuredConsoleEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
        Ok(Box::new(StructuredConsoleEncoder::new(pattern, config.max_value_len)))
    }
}
