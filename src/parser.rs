use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use thiserror::Error;

use crate::{max_flow::MaxFlowError, network::FlowNetwork};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read input: {0}")]
    Io(#[from] io::Error),
    #[error("missing 'p max <nodes> <arcs>' line")]
    MissingHeader,
    #[error("line {line}: duplicate problem line")]
    DuplicateHeader { line: usize },
    #[error("line {line}: terminal '{kind}' is already set")]
    DuplicateTerminal { line: usize, kind: char },
    #[error("line {line}: cannot parse '{content}'")]
    Malformed { line: usize, content: String },
    #[error("header declares {expected} arcs but {found} were given")]
    ArcCountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Network(#[from] MaxFlowError),
}

/// A network read from a DIMACS max-flow file, with its optional terminals (0 based).
#[derive(Clone, Debug)]
pub struct ParsedNetwork {
    pub network: FlowNetwork,
    pub source: Option<usize>,
    pub sink: Option<usize>,
}

fn malformed(line: usize, content: &str) -> ParseError {
    ParseError::Malformed {
        line,
        content: content.trim().to_string(),
    }
}

// DIMACS ids are 1 based
fn parse_vertex(token: Option<&str>, line: usize, content: &str) -> Result<usize, ParseError> {
    match token.and_then(|t| t.parse::<usize>().ok()) {
        Some(id) if id > 0 => Ok(id - 1),
        _ => Err(malformed(line, content)),
    }
}

impl ParsedNetwork {
    pub fn new(input: impl BufRead) -> Result<Self, ParseError> {
        let mut header: Option<(usize, usize)> = None;
        let mut source = None;
        let mut sink = None;
        let mut arcs = vec![];

        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let mut parts = line.split_whitespace();

            let Some(first) = parts.next() else {
                continue;
            };

            match first {
                "c" => continue,
                "p" => {
                    if header.is_some() {
                        return Err(ParseError::DuplicateHeader { line: line_no });
                    }
                    if parts.next() != Some("max") {
                        return Err(malformed(line_no, &line));
                    }
                    let nodes = parts.next().and_then(|x| x.parse().ok());
                    let arcs_count = parts.next().and_then(|x| x.parse().ok());
                    let (Some(nodes), Some(arcs_count)) = (nodes, arcs_count) else {
                        return Err(malformed(line_no, &line));
                    };
                    header = Some((nodes, arcs_count));
                }
                "n" => {
                    if header.is_none() {
                        return Err(ParseError::MissingHeader);
                    }
                    let vertex = parse_vertex(parts.next(), line_no, &line)?;
                    let (terminal, kind) = match parts.next() {
                        Some("s") => (&mut source, 's'),
                        Some("t") => (&mut sink, 't'),
                        _ => return Err(malformed(line_no, &line)),
                    };
                    if terminal.replace(vertex).is_some() {
                        return Err(ParseError::DuplicateTerminal {
                            line: line_no,
                            kind,
                        });
                    }
                }
                "a" => {
                    if header.is_none() {
                        return Err(ParseError::MissingHeader);
                    }
                    let from = parse_vertex(parts.next(), line_no, &line)?;
                    let to = parse_vertex(parts.next(), line_no, &line)?;
                    let Some(capacity) = parts.next().and_then(|x| x.parse::<i64>().ok()) else {
                        return Err(malformed(line_no, &line));
                    };
                    arcs.push((from, to, capacity));
                }
                _ => return Err(malformed(line_no, &line)),
            }
        }

        let Some((nodes, expected)) = header else {
            return Err(ParseError::MissingHeader);
        };

        if arcs.len() != expected {
            return Err(ParseError::ArcCountMismatch {
                expected,
                found: arcs.len(),
            });
        }

        for terminal in [source, sink].into_iter().flatten() {
            if terminal >= nodes {
                return Err(MaxFlowError::InvalidEndpoint {
                    vertex: terminal,
                    vertices: nodes,
                }
                .into());
            }
        }

        log::debug!("Parsed network with {} nodes and {} arcs", nodes, arcs.len());

        Ok(Self {
            network: FlowNetwork::new(nodes, arcs)?,
            source,
            sink,
        })
    }

    pub fn from_file(file: impl AsRef<Path>) -> Result<Self, ParseError> {
        Self::new(BufReader::new(File::open(file)?))
    }

    pub fn write(&self, mut output: impl Write) -> io::Result<()> {
        writeln!(
            output,
            "p max {} {}",
            self.network.vertex_count(),
            self.network.edge_count()
        )?;
        if let Some(source) = self.source {
            writeln!(output, "n {} s", source + 1)?;
        }
        if let Some(sink) = self.sink {
            writeln!(output, "n {} t", sink + 1)?;
        }
        for edge in self.network.edges() {
            writeln!(output, "a {} {} {}", edge.from + 1, edge.to + 1, edge.capacity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::max_flow::compute_max_flow;

    const DIAMOND: &str = include_str!("../demos/diamond.max");

    fn parse(text: &str) -> Result<ParsedNetwork, ParseError> {
        ParsedNetwork::new(text.as_bytes())
    }

    #[test]
    fn parses_the_diamond_demo() {
        let parsed = parse(DIAMOND).unwrap();
        assert_eq!(parsed.source, Some(0));
        assert_eq!(parsed.sink, Some(3));
        assert_eq!(
            parsed.network.edges(),
            FlowNetwork::diamond_with_chord().edges()
        );
        assert_eq!(compute_max_flow(&parsed.network, 0, 3).unwrap(), 3);
    }

    #[test]
    fn written_network_parses_back() {
        let parsed = parse("p max 3 2\nn 3 t\na 1 2 5\na 2 3 4\n").unwrap();
        let mut out = vec![];
        parsed.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p max 3 2\nn 3 t\na 1 2 5\na 2 3 4\n");
        let again = parse(&text).unwrap();
        assert_eq!(again.network.edges(), parsed.network.edges());
        assert_eq!(again.source, None);
        assert_eq!(again.sink, Some(2));
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        let parsed = parse("c hello\n\np max 2 1\n   \nc arc\na 1 2 7\n").unwrap();
        assert_eq!(parsed.network.edge_count(), 1);
        assert_eq!(parsed.network.edges()[0].capacity, 7);
    }

    #[test]
    fn header_errors() {
        assert!(matches!(parse("a 1 2 3\n"), Err(ParseError::MissingHeader)));
        assert!(matches!(parse("c only\n"), Err(ParseError::MissingHeader)));
        assert!(matches!(
            parse("p max 2 0\np max 2 0\n"),
            Err(ParseError::DuplicateHeader { line: 2 })
        ));
        assert!(matches!(
            parse("p min 2 0\n"),
            Err(ParseError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_lines() {
        assert!(matches!(
            parse("p max 2 1\na 1 x 3\n"),
            Err(ParseError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse("p max 2 1\na 0 1 3\n"),
            Err(ParseError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse("p max 2 1\nn 1 q\na 1 2 3\n"),
            Err(ParseError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse("p max 2 1\nx\n"),
            Err(ParseError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn repeated_terminals() {
        assert!(matches!(
            parse("p max 3 0\nn 1 s\nn 2 s\n"),
            Err(ParseError::DuplicateTerminal { line: 3, kind: 's' })
        ));
        assert!(matches!(
            parse("p max 3 0\nn 3 t\nn 1 s\nn 3 t\n"),
            Err(ParseError::DuplicateTerminal { line: 4, kind: 't' })
        ));
    }

    #[test]
    fn huge_node_count_is_not_allocated() {
        let parsed = parse("p max 18446744073709551615 0\nn 1 s\nn 2 t\n").unwrap();
        assert_eq!(compute_max_flow(&parsed.network, 0, 1), Ok(0));

        let parsed = parse("p max 18446744073709551615 1\na 1 18446744073709551615 3\n").unwrap();
        assert_eq!(
            compute_max_flow(&parsed.network, 0, usize::MAX - 1),
            Ok(3)
        );
    }

    #[test]
    fn semantic_errors() {
        assert!(matches!(
            parse("p max 2 2\na 1 2 3\n"),
            Err(ParseError::ArcCountMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            parse("p max 2 1\na 1 2 -3\n"),
            Err(ParseError::Network(MaxFlowError::NegativeCapacity { .. }))
        ));
        assert!(matches!(
            parse("p max 2 1\na 1 3 1\n"),
            Err(ParseError::Network(MaxFlowError::InvalidEdge { .. }))
        ));
        assert!(matches!(
            parse("p max 2 1\nn 5 s\na 1 2 1\n"),
            Err(ParseError::Network(MaxFlowError::InvalidEndpoint { vertex: 4, .. }))
        ));
    }
}
