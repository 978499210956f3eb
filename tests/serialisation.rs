//! Text-format round trips over whole networks.

use neurograph::io::{parse_feed_forward, parse_network, write_feed_forward, write_network};
use neurograph::{FeedForward, Features, Logistic, Network, Role};

fn four_neuron_example() -> Network<Logistic> {
    let mut net = Network::new();
    let act = Logistic::default();

    let in1 = net.add_neuron(Role::Input, act);
    let in2 = net.add_neuron(Role::Input, act);
    let x = net.add_neuron(Role::Inner, act);
    let out = net.add_neuron(Role::Output, act);

    net.neuron_mut(x).unwrap().set_dendrite(in1, 0.125);
    net.neuron_mut(x).unwrap().set_dendrite(in2, -0.25);
    net.neuron_mut(out).unwrap().set_dendrite(x, 1.5);
    net.neuron_mut(out).unwrap().set_dendrite(in1, 0.0625);

    net
}

#[test]
fn topology_reserialisation_is_byte_identical() {
    let net = four_neuron_example();

    let text = write_network(&net, "");
    let parsed: Network<Logistic> = parse_network(&text).unwrap();
    let text2 = write_network(&parsed, "");

    assert_eq!(text, text2);
}

#[test]
fn parsed_topology_is_structurally_isomorphic() {
    let net = four_neuron_example();
    let parsed: Network<Logistic> = parse_network(&write_network(&net, "")).unwrap();

    assert_eq!(parsed.len(), net.len());
    assert_eq!(parsed.slot_count(), net.slot_count());
    assert_eq!(parsed.input_indices(), net.input_indices());
    assert_eq!(parsed.output_indices(), net.output_indices());

    for n in net.neurons() {
        let p = parsed.neuron(n.index()).unwrap();
        assert_eq!(p.index(), n.index());
        assert_eq!(p.role(), n.role());
        assert_eq!(p.activation(), n.activation());
        assert_eq!(p.dendrites(), n.dendrites());
    }
}

#[test]
fn vacant_slots_survive_the_round_trip() {
    let mut net = four_neuron_example();
    net.remove_neuron(2).unwrap();

    let text = write_network(&net, "");
    let parsed: Network<Logistic> = parse_network(&text).unwrap();

    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed.slot_count(), 4);
    assert!(parsed.neuron(2).is_err());
    assert_eq!(write_network(&parsed, ""), text);
}

#[test]
fn feed_forward_reserialisation_is_byte_identical() {
    let ff: FeedForward<Logistic> = FeedForward::with_layers(
        &[2, 3, 1],
        || 0.0625,
        Features::BIAS | Features::LATERAL_PREV,
        Logistic::steep(15.0),
    )
    .unwrap();

    let text = write_feed_forward(&ff);
    let parsed: FeedForward<Logistic> = parse_feed_forward(&text).unwrap();

    assert_eq!(parsed.features(), ff.features());
    assert_eq!(write_feed_forward(&parsed), text);
}

#[test]
fn parsed_feed_forward_still_evaluates() {
    let ff: FeedForward<Logistic> =
        FeedForward::with_layers(&[2, 2, 1], || 0.25, Features::BIAS, Logistic::default())
            .unwrap();

    let mut parsed: FeedForward<Logistic> =
        parse_feed_forward(&write_feed_forward(&ff)).unwrap();

    let input = [0.5, -0.5];
    let expected = ff.function().unwrap().call(&input).unwrap();
    let actual = parsed.function().unwrap().call(&input).unwrap();
    assert_eq!(expected, actual);

    // The parsed network trains as well: the bias pin came back with the
    // feature bits.
    let mut trainer = parsed.training();
    let mut criterion = neurograph::ConstantRate::new(0.0, 0.1);
    trainer
        .train_one(parsed.topology_mut(), &input, &[0.25], &mut criterion)
        .unwrap();
}

#[cfg(feature = "serde")]
mod json {
    use super::*;

    #[test]
    fn feed_forward_json_round_trip_is_stable() {
        let ff: FeedForward<Logistic> = FeedForward::with_layers(
            &[2, 2, 1],
            || 0.125,
            Features::BIAS,
            Logistic::default(),
        )
        .unwrap();

        let json = ff.to_json_string_pretty().unwrap();
        let restored = FeedForward::<Logistic>::from_json_str(&json).unwrap();

        assert_eq!(restored.features(), ff.features());
        assert_eq!(restored.to_json_string_pretty().unwrap(), json);
    }
}
