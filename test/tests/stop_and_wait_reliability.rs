/// END-TO-END TESTS: Stop-and-Wait delivery over lossy links
///
/// Every message must arrive exactly once and in send order, however many
/// datagrams the link drops or duplicates.
use std::{
    sync::{Arc, Weak},
    thread,
    time::Duration,
};

use lockstep_session::{ChannelBinding, NetworkSession};
use lockstep_shared::{
    channel_codes, decode_string, encode_string, ChannelContext, ChannelResult, PacketLossChannel,
    StopAndWaitChannel,
};
use lockstep_test::{Inbox, LinkConditions, LocalNetwork};

const RETRANSMIT: Duration = Duration::from_millis(15);
const PATIENCE: Duration = Duration::from_secs(20);

fn lossy_stop_and_wait(
    loss_chance: f32,
    seed: u64,
) -> impl FnOnce(Arc<dyn ChannelContext>) -> ChannelResult {
    move |context: Arc<dyn ChannelContext>| -> ChannelResult {
        let channel = StopAndWaitChannel::with_timeout(context, RETRANSMIT)?;
        Ok(Box::new(PacketLossChannel::with_seed(
            Box::new(channel),
            loss_chance,
            seed,
        )?))
    }
}

fn fast_stop_and_wait(context: Arc<dyn ChannelContext>) -> ChannelResult {
    Ok(Box::new(StopAndWaitChannel::with_timeout(context, RETRANSMIT)?))
}

fn binding_to(session: &NetworkSession) -> ChannelBinding {
    ChannelBinding::new(session.local_address(), channel_codes::RELIABLE_ORDERED_1)
}

#[test]
fn one_way_delivery_survives_sixty_percent_loss() {
    let _ = env_logger::builder().is_test(true).try_init();

    let network = LocalNetwork::new();
    let alice = network.session();
    let bob = network.session();
    let alice_inbox = Inbox::new();
    let bob_inbox = Inbox::new();

    alice
        .connect(binding_to(&bob), lossy_stop_and_wait(0.6, 1), alice_inbox.listener())
        .unwrap();
    bob.connect(binding_to(&alice), lossy_stop_and_wait(0.6, 2), bob_inbox.listener())
        .unwrap();

    let words = ["This", "is", "a", "test", "of", "stop", "and", "wait"];
    for word in words {
        alice.send(&binding_to(&bob), word.as_bytes()).unwrap();
    }

    assert!(bob_inbox.wait_for(words.len(), PATIENCE));
    // late retransmissions must not be delivered again
    thread::sleep(RETRANSMIT * 10);

    let expected: Vec<Vec<u8>> = words.iter().map(|word| word.as_bytes().to_vec()).collect();
    assert_eq!(bob_inbox.messages(), expected);
    assert!(alice_inbox.is_empty());

    alice.stop();
    bob.stop();
}

#[test]
fn two_way_exchange_survives_ninety_percent_loss() {
    let network = LocalNetwork::new();
    let alice = network.session();
    let bob = network.session();
    let alice_inbox = Inbox::new();
    let bob_inbox = Inbox::new();

    alice
        .connect(binding_to(&bob), lossy_stop_and_wait(0.9, 3), alice_inbox.listener())
        .unwrap();
    bob.connect(binding_to(&alice), lossy_stop_and_wait(0.9, 4), bob_inbox.listener())
        .unwrap();

    alice.send(&binding_to(&bob), b"from alice").unwrap();
    bob.send(&binding_to(&alice), b"from bob").unwrap();

    assert!(alice_inbox.wait_for(1, PATIENCE));
    assert!(bob_inbox.wait_for(1, PATIENCE));
    thread::sleep(RETRANSMIT * 10);

    assert_eq!(alice_inbox.messages(), vec![b"from bob".to_vec()]);
    assert_eq!(bob_inbox.messages(), vec![b"from alice".to_vec()]);

    alice.stop();
    bob.stop();
}

#[test]
fn in_order_over_dropping_and_duplicating_network() {
    let conditions = LinkConditions {
        drop_chance: 0.3,
        duplicate_chance: 0.3,
    };
    let network = LocalNetwork::with_conditions(conditions, 99);
    let alice = network.session();
    let bob = network.session();
    let alice_inbox = Inbox::new();
    let bob_inbox = Inbox::new();

    alice
        .connect(binding_to(&bob), fast_stop_and_wait, alice_inbox.listener())
        .unwrap();
    bob.connect(binding_to(&alice), fast_stop_and_wait, bob_inbox.listener())
        .unwrap();

    // more than 256 messages, so the 8-bit sequence wraps
    for index in 0..260u32 {
        alice.send(&binding_to(&bob), &index.to_be_bytes()).unwrap();
    }

    assert!(bob_inbox.wait_for(260, Duration::from_secs(60)));
    thread::sleep(RETRANSMIT * 10);

    let received: Vec<u32> = bob_inbox
        .messages()
        .iter()
        .map(|message| u32::from_be_bytes([message[0], message[1], message[2], message[3]]))
        .collect();
    assert_eq!(received, (0..260).collect::<Vec<_>>());

    alice.stop();
    bob.stop();
}

/// Records every count it receives and answers with the next one, up to 100
fn counter(
    session: &Arc<NetworkSession>,
    reply_to: ChannelBinding,
    inbox: &Inbox,
) -> impl Fn(Vec<u8>) + Send + Sync + 'static {
    let weak_session: Weak<NetworkSession> = Arc::downgrade(session);
    let record = inbox.listener();
    move |message: Vec<u8>| {
        let Ok(count) = decode_string(&message).map(|text| text.parse::<u32>()) else {
            return;
        };
        record(message);
        let Ok(count) = count else {
            return;
        };
        if count >= 100 {
            return;
        }
        if let Some(session) = weak_session.upgrade() {
            let _ = session.send(&reply_to, &encode_string(&(count + 1).to_string()));
        }
    }
}

fn counts(inbox: &Inbox) -> Vec<u32> {
    inbox
        .messages()
        .iter()
        .map(|message| decode_string(message).unwrap().parse().unwrap())
        .collect()
}

#[test]
fn ping_pong_counts_to_one_hundred() {
    let conditions = LinkConditions {
        drop_chance: 0.2,
        duplicate_chance: 0.1,
    };
    let network = LocalNetwork::with_conditions(conditions, 7);
    let alice = network.session();
    let bob = network.session();
    let alice_inbox = Inbox::new();
    let bob_inbox = Inbox::new();

    let to_bob = binding_to(&bob);
    let to_alice = binding_to(&alice);
    alice
        .connect(to_bob, fast_stop_and_wait, counter(&alice, to_bob, &alice_inbox))
        .unwrap();
    bob.connect(to_alice, fast_stop_and_wait, counter(&bob, to_alice, &bob_inbox))
        .unwrap();

    alice.send(&to_bob, &encode_string("0")).unwrap();

    assert!(bob_inbox.wait_for(51, PATIENCE));
    thread::sleep(RETRANSMIT * 10);

    assert_eq!(counts(&bob_inbox), (0..=100).step_by(2).collect::<Vec<u32>>());
    assert_eq!(counts(&alice_inbox), (1..100).step_by(2).collect::<Vec<u32>>());

    alice.stop();
    bob.stop();
}
