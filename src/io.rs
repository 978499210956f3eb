//! Plain-text (de)serialisation of topologies and feed-forward networks.
//!
//! The format is line-oriented:
//!
//! ```text
//! NNTopology
//!     Neuron <idx>
//!         type = <INPUT|INNER|OUTPUT>
//!         f    = <activation literal>
//!     NeuronEnd
//!     Synapsis <src> -> <dst> weight = <number>
//! NNTopologyEnd
//! ```
//!
//! A feed-forward network wraps its topology:
//!
//! ```text
//! FFNN
//!     features = 0x<hex>
//!     <topology block, indented>
//! FFNNEnd
//! ```
//!
//! On input, `#` starts a comment running to the end of the line; blank
//! lines and surrounding whitespace are ignored. Writing is deterministic,
//! so `write(parse(write(n)))` is byte-identical to `write(n)`.

use crate::activation::{Activation, Identity, Logistic, Tanh};
use crate::feed_forward::{Features, FeedForward};
use crate::topology::{Network, Role};
use crate::{Error, Result};

/// Text-literal round-trip capability of an activation type.
///
/// `parse_literal(&literal())` must reconstruct the activation; a literal
/// that does not match the type's grammar is an [`Error::Parse`].
pub trait ActivationLiteral: Sized {
    /// Renders the activation as its literal (e.g. `logistic(0,1,1)`).
    fn literal(&self) -> String;

    /// Parses an activation from its literal.
    fn parse_literal(text: &str) -> Result<Self>;
}

impl ActivationLiteral for Logistic {
    fn literal(&self) -> String {
        format!("logistic({},{},{})", self.x0, self.l, self.k)
    }

    fn parse_literal(text: &str) -> Result<Self> {
        let inner = text
            .strip_prefix("logistic(")
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| Error::Parse(format!("malformed logistic literal: {text:?}")))?;

        let params: Vec<&str> = inner.split(',').collect();
        if params.len() != 3 {
            return Err(Error::Parse(format!(
                "logistic literal needs 3 parameters: {text:?}"
            )));
        }

        let parse = |p: &str| -> Result<f64> {
            let value: f64 = p
                .trim()
                .parse()
                .map_err(|_| Error::Parse(format!("bad logistic parameter: {p:?}")))?;
            if !value.is_finite() {
                return Err(Error::Parse(format!("non-finite logistic parameter: {p:?}")));
            }
            Ok(value)
        };

        Ok(Logistic::new(
            parse(params[0])?,
            parse(params[1])?,
            parse(params[2])?,
        ))
    }
}

impl ActivationLiteral for Identity {
    fn literal(&self) -> String {
        "identity".to_owned()
    }

    fn parse_literal(text: &str) -> Result<Self> {
        if text == "identity" {
            Ok(Identity)
        } else {
            Err(Error::Parse(format!("expected identity literal: {text:?}")))
        }
    }
}

impl ActivationLiteral for Tanh {
    fn literal(&self) -> String {
        "tanh".to_owned()
    }

    fn parse_literal(text: &str) -> Result<Self> {
        if text == "tanh" {
            Ok(Tanh)
        } else {
            Err(Error::Parse(format!("expected tanh literal: {text:?}")))
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Inner => "INNER",
        Role::Input => "INPUT",
        Role::Output => "OUTPUT",
    }
}

fn parse_role(text: &str) -> Result<Role> {
    match text {
        "INNER" => Ok(Role::Inner),
        "INPUT" => Ok(Role::Input),
        "OUTPUT" => Ok(Role::Output),
        other => Err(Error::Parse(format!("unknown neuron type: {other:?}"))),
    }
}

/// Serialises a topology, prefixing every line with `indent`.
pub fn write_network<A: ActivationLiteral>(network: &Network<A>, indent: &str) -> String {
    let mut out = String::new();

    out.push_str(indent);
    out.push_str("NNTopology\n");

    for n in network.neurons() {
        out.push_str(&format!("{indent}    Neuron {}\n", n.index()));
        out.push_str(&format!("{indent}        type = {}\n", role_name(n.role())));
        out.push_str(&format!("{indent}        f    = {}\n", n.activation().literal()));
        out.push_str(&format!("{indent}    NeuronEnd\n"));
    }

    for n in network.neurons() {
        for d in n.dendrites() {
            out.push_str(&format!(
                "{indent}    Synapsis {} -> {} weight = {}\n",
                d.source,
                n.index(),
                d.weight
            ));
        }
    }

    out.push_str(indent);
    out.push_str("NNTopologyEnd\n");

    out
}

/// Serialises a feed-forward network.
pub fn write_feed_forward<A: Activation + Clone + ActivationLiteral>(
    ff: &FeedForward<A>,
) -> String {
    let mut out = String::new();

    out.push_str("FFNN\n");
    out.push_str(&format!("    features = {:#x}\n", ff.features().bits()));
    out.push_str(&write_network(ff.topology(), "    "));
    out.push_str("FFNNEnd\n");

    out
}

/// Content lines of the input: comments stripped, blanks skipped,
/// whitespace trimmed. Yields 1-based line numbers for diagnostics.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        for (no, raw) in self.inner.by_ref() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();

            if !line.is_empty() {
                return Some((no + 1, line));
            }
        }

        None
    }

    fn expect(&mut self, what: &str) -> Result<(usize, &'a str)> {
        self.next()
            .ok_or_else(|| Error::Parse(format!("unexpected end of input, expected {what}")))
    }
}

fn key_value<'a>(no: usize, line: &'a str, key: &str) -> Result<&'a str> {
    let (k, v) = line
        .split_once('=')
        .ok_or_else(|| Error::Parse(format!("line {no}: expected \"{key} = ...\"")))?;

    if k.trim() != key {
        return Err(Error::Parse(format!(
            "line {no}: expected \"{key} = ...\", got {line:?}"
        )));
    }

    Ok(v.trim())
}

fn parse_index(no: usize, token: &str) -> Result<usize> {
    token
        .parse()
        .map_err(|_| Error::Parse(format!("line {no}: bad neuron index {token:?}")))
}

/// Parses a topology.
pub fn parse_network<A: ActivationLiteral>(text: &str) -> Result<Network<A>> {
    let mut lines = Lines::new(text);
    let network = parse_network_block(&mut lines)?;

    if let Some((no, line)) = lines.next() {
        return Err(Error::Parse(format!(
            "line {no}: trailing content after NNTopologyEnd: {line:?}"
        )));
    }

    Ok(network)
}

fn parse_network_block<A: ActivationLiteral>(lines: &mut Lines<'_>) -> Result<Network<A>> {
    let (no, line) = lines.expect("NNTopology")?;
    if line != "NNTopology" {
        return Err(Error::Parse(format!(
            "line {no}: expected NNTopology, got {line:?}"
        )));
    }

    let mut network = Network::new();

    loop {
        let (no, line) = lines.expect("NNTopologyEnd")?;

        if line == "NNTopologyEnd" {
            return Ok(network);
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.first() {
            Some(&"Neuron") => {
                if tokens.len() != 2 {
                    return Err(Error::Parse(format!(
                        "line {no}: expected \"Neuron <idx>\", got {line:?}"
                    )));
                }
                let index = parse_index(no, tokens[1])?;
                parse_neuron_block(lines, &mut network, index)?;
            }

            Some(&"Synapsis") => {
                // Synapsis <src> -> <dst> weight = <number>
                if tokens.len() != 7 || tokens[2] != "->" || tokens[4] != "weight" || tokens[5] != "="
                {
                    return Err(Error::Parse(format!(
                        "line {no}: expected \"Synapsis <src> -> <dst> weight = <number>\", \
                         got {line:?}"
                    )));
                }

                let source = parse_index(no, tokens[1])?;
                let target = parse_index(no, tokens[3])?;
                let weight: f64 = tokens[6]
                    .parse()
                    .map_err(|_| Error::Parse(format!("line {no}: bad weight {:?}", tokens[6])))?;

                if network.neuron(source).is_err() {
                    return Err(Error::Parse(format!(
                        "line {no}: synapsis source {source} does not exist"
                    )));
                }

                network
                    .neuron_mut(target)
                    .map_err(|_| {
                        Error::Parse(format!("line {no}: synapsis target {target} does not exist"))
                    })?
                    .set_dendrite(source, weight);
            }

            _ => {
                return Err(Error::Parse(format!(
                    "line {no}: expected Neuron, Synapsis or NNTopologyEnd, got {line:?}"
                )));
            }
        }
    }
}

fn parse_neuron_block<A: ActivationLiteral>(
    lines: &mut Lines<'_>,
    network: &mut Network<A>,
    index: usize,
) -> Result<()> {
    let (no, line) = lines.expect("type = ...")?;
    let role = parse_role(key_value(no, line, "type")?)?;

    let (no, line) = lines.expect("f = ...")?;
    let activation = A::parse_literal(key_value(no, line, "f")?)?;

    let (no, line) = lines.expect("NeuronEnd")?;
    if line != "NeuronEnd" {
        return Err(Error::Parse(format!(
            "line {no}: expected NeuronEnd, got {line:?}"
        )));
    }

    network.set_neuron(index, role, activation);
    Ok(())
}

/// Parses a feed-forward network.
pub fn parse_feed_forward<A: Activation + Clone + ActivationLiteral>(
    text: &str,
) -> Result<FeedForward<A>> {
    let mut lines = Lines::new(text);

    let (no, line) = lines.expect("FFNN")?;
    if line != "FFNN" {
        return Err(Error::Parse(format!("line {no}: expected FFNN, got {line:?}")));
    }

    let (no, line) = lines.expect("features = ...")?;
    let value = key_value(no, line, "features")?;
    let bits = match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    }
    .map_err(|_| Error::Parse(format!("line {no}: bad features value {value:?}")))?;

    let network = parse_network_block(&mut lines)?;

    let (no, line) = lines.expect("FFNNEnd")?;
    if line != "FFNNEnd" {
        return Err(Error::Parse(format!(
            "line {no}: expected FFNNEnd, got {line:?}"
        )));
    }

    if let Some((no, line)) = lines.next() {
        return Err(Error::Parse(format!(
            "line {no}: trailing content after FFNNEnd: {line:?}"
        )));
    }

    Ok(FeedForward::from_parts(Features::from_bits(bits), network))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logistic_literal_round_trips() {
        let f = Logistic::new(0.5, 2.0, 15.0);
        let literal = f.literal();
        assert_eq!(literal, "logistic(0.5,2,15)");
        assert_eq!(Logistic::parse_literal(&literal).unwrap(), f);

        assert_eq!(
            Logistic::parse_literal("logistic(0,1,1)").unwrap(),
            Logistic::default()
        );
    }

    #[test]
    fn malformed_literals_are_parse_errors() {
        assert!(matches!(
            Logistic::parse_literal("logistic(0,1)"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            Logistic::parse_literal("logistic(0,1,1,1)"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            Logistic::parse_literal("sigmoid(0,1,1)"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            Logistic::parse_literal("logistic(a,1,1)"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            Identity::parse_literal("tanh"),
            Err(Error::Parse(_))
        ));
    }

    fn sample_network() -> Network<Identity> {
        let mut net = Network::new();
        let in1 = net.add_neuron(Role::Input, Identity);
        let in2 = net.add_neuron(Role::Input, Identity);
        let x = net.add_neuron(Role::Inner, Identity);
        let out = net.add_neuron(Role::Output, Identity);

        net.neuron_mut(x).unwrap().set_dendrite(in1, 0.25);
        net.neuron_mut(x).unwrap().set_dendrite(in2, -1.5);
        net.neuron_mut(out).unwrap().set_dendrite(x, 2.0);

        net
    }

    #[test]
    fn network_round_trip_is_byte_stable() {
        let net = sample_network();

        let text = write_network(&net, "");
        let parsed: Network<Identity> = parse_network(&text).unwrap();
        let text2 = write_network(&parsed, "");

        assert_eq!(text, text2);
    }

    #[test]
    fn parse_preserves_structure() {
        let net = sample_network();
        let parsed: Network<Identity> = parse_network(&write_network(&net, "")).unwrap();

        assert_eq!(parsed.len(), net.len());
        assert_eq!(parsed.input_indices(), net.input_indices());
        assert_eq!(parsed.output_indices(), net.output_indices());

        for n in net.neurons() {
            let p = parsed.neuron(n.index()).unwrap();
            assert_eq!(p.role(), n.role());
            assert_eq!(p.dendrites(), n.dendrites());
        }
    }

    #[test]
    fn comments_blanks_and_whitespace_are_ignored() {
        let text = "\n\
            # a topology\n\
            \tNNTopology  \n\
            \n\
            Neuron 0\n\
            type = INPUT   # the only input\n\
            f = identity\n\
            NeuronEnd\n\
            Neuron 1\n\
            type = OUTPUT\n\
            f    = identity\n\
            NeuronEnd\n\
            Synapsis 0 -> 1 weight = 0.5\n\
            NNTopologyEnd\n";

        let net: Network<Identity> = parse_network(text).unwrap();
        assert_eq!(net.len(), 2);
        assert_eq!(net.neuron(1).unwrap().dendrite(0).unwrap().weight, 0.5);
    }

    #[test]
    fn dangling_synapsis_source_is_a_parse_error() {
        let text = "NNTopology\n\
            Neuron 0\n\
            type = OUTPUT\n\
            f = identity\n\
            NeuronEnd\n\
            Synapsis 3 -> 0 weight = 1\n\
            NNTopologyEnd\n";

        let err = parse_network::<Identity>(text);
        assert!(matches!(err, Err(Error::Parse(_))));
    }

    #[test]
    fn truncated_input_is_a_parse_error() {
        let text = "NNTopology\nNeuron 0\ntype = INPUT\n";
        let err = parse_network::<Identity>(text);
        assert!(matches!(err, Err(Error::Parse(_))));
    }

    #[test]
    fn feed_forward_round_trip_keeps_features() {
        let ff = FeedForward::with_layers(
            &[2, 2, 1],
            || 0.125,
            Features::BIAS | Features::LATERAL_PREV,
            Logistic::default(),
        )
        .unwrap();

        let text = write_feed_forward(&ff);
        assert!(text.contains("features = 0x3"));

        let parsed: FeedForward<Logistic> = parse_feed_forward(&text).unwrap();
        assert_eq!(parsed.features(), ff.features());
        assert_eq!(parsed.topology().len(), ff.topology().len());

        assert_eq!(write_feed_forward(&parsed), text);
    }
}
