/// END-TO-END TESTS: NetworkSession demultiplexing
///
/// Datagrams are routed by (source address, channel code). A datagram for one
/// binding must never reach the channel of another.
use std::{collections::HashSet, thread, time::Duration};

use lockstep_session::{transport::Socket, ChannelBinding, SessionError};
use lockstep_shared::{channel_codes, UnreliableUnorderedChannel};
use lockstep_test::{Inbox, LocalNetwork};

const SETTLE: Duration = Duration::from_millis(100);

#[test]
fn same_peer_different_codes_never_cross_deliver() {
    let _ = env_logger::builder().is_test(true).try_init();

    let network = LocalNetwork::new();
    let alice = network.session();
    let bob = network.session();
    let code_a = channel_codes::UNRELIABLE_ORDERED_1;
    let code_b = channel_codes::UNRELIABLE_ORDERED_2;

    let bob_a = Inbox::new();
    let bob_b = Inbox::new();
    for (code, inbox) in [(code_a, &bob_a), (code_b, &bob_b)] {
        bob.connect(
            ChannelBinding::new(alice.local_address(), code),
            UnreliableUnorderedChannel::create,
            inbox.listener(),
        )
        .unwrap();
        alice
            .connect(
                ChannelBinding::new(bob.local_address(), code),
                UnreliableUnorderedChannel::create,
                Inbox::new().listener(),
            )
            .unwrap();
    }

    for index in 0..10u8 {
        alice
            .send(&ChannelBinding::new(bob.local_address(), code_a), &[b'a', index])
            .unwrap();
        alice
            .send(&ChannelBinding::new(bob.local_address(), code_b), &[b'b', index])
            .unwrap();
    }

    assert!(bob_a.wait_for(10, Duration::from_secs(5)));
    assert!(bob_b.wait_for(10, Duration::from_secs(5)));
    thread::sleep(SETTLE);

    assert!(bob_a.messages().iter().all(|message| message[0] == b'a'));
    assert!(bob_b.messages().iter().all(|message| message[0] == b'b'));
    assert_eq!(bob_a.len(), 10);
    assert_eq!(bob_b.len(), 10);
}

#[test]
fn unbound_and_empty_datagrams_are_dropped() {
    let network = LocalNetwork::new();
    let session = network.session();
    let known = network.socket();
    let stranger = network.socket();
    let inbox = Inbox::new();

    let known_address = known.local_address();
    let stranger_address = stranger.local_address();

    session
        .connect(
            ChannelBinding::new(known_address, channel_codes::UNRELIABLE_UNORDERED),
            UnreliableUnorderedChannel::create,
            inbox.listener(),
        )
        .unwrap();

    // right address, wrong code
    network.inject(known_address, &session.local_address(), &[channel_codes::RELIABLE_ORDERED_4, 1]);
    // right code, wrong address
    network.inject(stranger_address, &session.local_address(), &[channel_codes::UNRELIABLE_UNORDERED, 2]);
    // no code at all
    network.inject(known_address, &session.local_address(), &[]);
    // a match, with the code stripped on delivery
    network.inject(known_address, &session.local_address(), &[channel_codes::UNRELIABLE_UNORDERED, 3]);

    assert!(inbox.wait_for(1, Duration::from_secs(5)));
    thread::sleep(SETTLE);
    assert_eq!(inbox.messages(), vec![vec![3]]);

    session.stop();
}

#[test]
fn bindings_are_exclusive_and_snapshotted() {
    let network = LocalNetwork::new();
    let session = network.session();
    let peer_one = network.session();
    let peer_two = network.session();

    let one_plain = ChannelBinding::new(peer_one.local_address(), channel_codes::UNRELIABLE_UNORDERED);
    let one_reliable = ChannelBinding::new(peer_one.local_address(), channel_codes::RELIABLE_ORDERED_1);
    let two_plain = ChannelBinding::new(peer_two.local_address(), channel_codes::UNRELIABLE_UNORDERED);
    for binding in [one_plain, one_reliable, two_plain] {
        session
            .connect(binding, UnreliableUnorderedChannel::create, Inbox::new().listener())
            .unwrap();
    }

    let again = session.connect(one_plain, UnreliableUnorderedChannel::create, Inbox::new().listener());
    assert!(matches!(again, Err(SessionError::BindingInUse { binding }) if binding == one_plain));

    assert_eq!(
        session.bindings(),
        HashSet::from([one_plain, one_reliable, two_plain])
    );
    assert_eq!(
        session.peers(),
        HashSet::from([peer_one.local_address(), peer_two.local_address()])
    );
    assert_eq!(session.channels().len(), 3);

    session.stop();
    assert!(session.bindings().is_empty());
    assert!(session.peers().is_empty());
}
