//! Command-line mode selection and the one-shot question mode

use anyhow::{bail, Context};
use docchat_context::Generator;
use docchat_search::{best_match, Corpus};
use std::io::Write;

/// Characters of the matched document echoed before the answer
pub const PREVIEW_CHARS: usize = 300;

const USAGE: &str = "usage: docchat [serve [--port <port>] | ask <question> | --search <question>]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server, optionally overriding the configured port
    Serve { port: Option<u16> },
    /// Answer one question on stdout and exit
    Ask { question: String },
}

/// Parse process arguments (without the program name)
pub fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let Some((first, rest)) = args.split_first() else {
        return Ok(Command::Serve { port: None });
    };

    match first.as_str() {
        "serve" => parse_serve(rest),
        "--port" | "-port" => parse_serve(&args),
        "ask" | "--search" | "-search" => {
            let question = rest.join(" ");
            if question.trim().is_empty() {
                bail!("missing question\n{USAGE}");
            }
            Ok(Command::Ask { question })
        }
        other => {
            if let Some(question) = other.strip_prefix("--search=") {
                return Ok(Command::Ask {
                    question: question.to_string(),
                });
            }
            bail!("unknown argument '{other}'\n{USAGE}")
        }
    }
}

fn parse_serve(args: &[String]) -> anyhow::Result<Command> {
    match args {
        [] => Ok(Command::Serve { port: None }),
        [flag, value] if flag == "--port" || flag == "-port" => {
            let port = value
                .parse::<u16>()
                .with_context(|| format!("invalid port '{value}'"))?;
            Ok(Command::Serve { port: Some(port) })
        }
        _ => bail!("unexpected arguments\n{USAGE}"),
    }
}

/// Answer `question` once, writing the matched document and the answer to `out`
pub async fn run_ask<W: Write>(
    out: &mut W,
    question: &str,
    corpus: &Corpus,
    generator: &dyn Generator,
) -> anyhow::Result<()> {
    let Some(document) = best_match(question, corpus) else {
        writeln!(out, "No matching documents found")?;
        return Ok(());
    };

    writeln!(out, "Most relevant document: {}", document.path())?;
    writeln!(out, "Content preview:\n{}", preview(document.content(), PREVIEW_CHARS))?;
    writeln!(out, "\nGenerating answer based on the document...")?;
    out.flush()?;

    let answer = generator
        .generate(document.content(), question)
        .await
        .context("Error generating answer")?;
    writeln!(out, "\nAnswer: {answer}")?;
    Ok(())
}

/// First `max_chars` characters of `content`, with `...` appended when cut
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docchat_common::errors::{AppError, Result};
    use docchat_context::ChunkSink;
    use docchat_search::Document;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    struct FixedGenerator(std::result::Result<&'static str, u16>);

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(&self, _document: &str, _question: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|status| AppError::BackendStatus { status })
        }

        async fn generate_streaming(&self, _document: &str, _question: &str, sink: &ChunkSink) -> Result<()> {
            let answer = self.generate("", "").await?;
            sink.send(answer);
            Ok(())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_parse_defaults_to_serve() {
        assert_eq!(parse_args(args(&[])).unwrap(), Command::Serve { port: None });
        assert_eq!(parse_args(args(&["serve"])).unwrap(), Command::Serve { port: None });
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(
            parse_args(args(&["serve", "--port", "9000"])).unwrap(),
            Command::Serve { port: Some(9000) }
        );
        assert_eq!(
            parse_args(args(&["-port", "9001"])).unwrap(),
            Command::Serve { port: Some(9001) }
        );
        assert!(parse_args(args(&["serve", "--port", "nope"])).is_err());
    }

    #[test]
    fn test_parse_question() {
        let expected = Command::Ask {
            question: "what is ownership".to_string(),
        };
        assert_eq!(parse_args(args(&["ask", "what", "is", "ownership"])).unwrap(), expected);
        assert_eq!(parse_args(args(&["--search", "what is ownership"])).unwrap(), expected);
        assert_eq!(parse_args(args(&["--search=what is ownership"])).unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_missing_question_and_unknown_flags() {
        assert!(parse_args(args(&["ask"])).is_err());
        assert!(parse_args(args(&["--search", "  "])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 300), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
        // Cut on character boundaries
        assert_eq!(preview("héllo wörld", 7), "héllo w...");
    }

    #[tokio::test]
    async fn test_ask_prints_document_and_answer() {
        let corpus = Corpus::from_documents(vec![
            Document::new("docs/cats.md", "cats purr softly"),
            Document::new("docs/dogs.md", "dogs bark loudly at dogs"),
        ]);
        let mut out = Vec::new();

        run_ask(&mut out, "why do dogs bark", &corpus, &FixedGenerator(Ok("Because.")))
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Most relevant document: docs/dogs.md\n"));
        assert!(printed.contains("Content preview:\ndogs bark loudly at dogs\n"));
        assert!(printed.ends_with("\nAnswer: Because.\n"));
    }

    #[tokio::test]
    async fn test_ask_without_match() {
        let corpus = Corpus::from_documents(vec![Document::new("a.txt", "nothing relevant")]);
        let mut out = Vec::new();

        tokio_test::assert_ok!(run_ask(&mut out, "elephants", &corpus, &FixedGenerator(Ok("unused"))).await);

        assert_eq!(String::from_utf8(out).unwrap(), "No matching documents found\n");
    }

    #[tokio::test]
    async fn test_ask_generation_failure() {
        let corpus = Corpus::from_documents(vec![Document::new("a.txt", "rust ownership rules")]);
        let mut out = Vec::new();

        let err = tokio_test::assert_err!(run_ask(&mut out, "ownership", &corpus, &FixedGenerator(Err(500))).await);

        assert!(format!("{err:#}").contains("Unexpected status code: 500"));
        assert!(String::from_utf8(out).unwrap().contains("Most relevant document: a.txt"));
    }
}
