use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable report to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable report to stdout in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Example {
        file: &'static str,
        carriers: u32,
    }

    #[test]
    fn json_render_is_valid_json() {
        let value = Example {
            file: "graph.hpp",
            carriers: 3,
        };
        let out = render(&value, OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["file"], "graph.hpp");
        assert_eq!(parsed["carriers"], 3);
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let value = Example {
            file: "graph.hpp",
            carriers: 3,
        };
        let out = render(&value, OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["carriers"], 3);
    }
}
