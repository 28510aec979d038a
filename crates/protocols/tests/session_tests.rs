//! Tests for driving handshakes over a real connection

mod common;

use core::time::Duration;

use common::{challenge, create_test_key_pair, init_tracing, server_challenge};
use futures_util::SinkExt;
use peerauth_crypto::{OsChallengeSource, SeededChallengeSource};
use peerauth_network_primitives::{CodecError, Packet, PacketType};
use peerauth_protocols::session::{self, packet_stream, SessionError};
use peerauth_protocols::{HandshakeConfig, VerificationResult};
use tokio::io::duplex;

fn assert_send<T: Send>(_: &T) {}

#[tokio::test]
async fn test_peers_authenticate_each_other() {
    init_tracing();

    let a = create_test_key_pair();
    let b = create_test_key_pair();
    let config = HandshakeConfig::default();

    let (a_io, b_io) = duplex(1_024);
    let mut a_stream = packet_stream(a_io, &config);
    let mut b_stream = packet_stream(b_io, &config);

    let (a_result, b_result) = tokio::join!(
        session::challenge(
            &mut a_stream,
            a.clone(),
            *b.public_key(),
            OsChallengeSource,
            &config
        ),
        session::authenticate(
            &mut b_stream,
            b.clone(),
            *a.public_key(),
            SeededChallengeSource::from_u64(7),
            &config
        ),
    );

    assert_eq!(a_result.unwrap(), VerificationResult::Success);
    assert_eq!(b_result.unwrap(), VerificationResult::Success);
}

#[tokio::test]
async fn test_responder_rejects_unexpected_challenger() {
    let a = create_test_key_pair();
    let b = create_test_key_pair();
    let someone_else = create_test_key_pair();
    let config = HandshakeConfig::default();

    let (a_io, b_io) = duplex(1_024);
    let mut a_stream = packet_stream(a_io, &config);
    let mut b_stream = packet_stream(b_io, &config);

    let (a_result, b_result) = tokio::join!(
        session::challenge(
            &mut a_stream,
            a.clone(),
            *b.public_key(),
            OsChallengeSource,
            &config
        ),
        session::authenticate(
            &mut b_stream,
            b.clone(),
            *someone_else.public_key(),
            OsChallengeSource,
            &config
        ),
    );

    // A has verified B and sent its proof; only B can tell the proof is wrong
    assert_eq!(a_result.unwrap(), VerificationResult::Success);
    assert_eq!(b_result.unwrap(), VerificationResult::FailedChallenge);
}

#[tokio::test]
async fn test_non_auth_traffic_is_malformed() {
    let config = HandshakeConfig::default();
    let (a_io, b_io) = duplex(1_024);
    let mut a_stream = packet_stream(a_io, &config);
    let mut b_stream = packet_stream(b_io, &config);

    let gossip = Packet::new(PacketType::Other(99), vec![1; 16]).unwrap();
    a_stream.send(gossip).await.unwrap();

    let result = session::authenticate(
        &mut b_stream,
        create_test_key_pair(),
        *create_test_key_pair().public_key(),
        OsChallengeSource,
        &config,
    )
    .await;

    assert_eq!(result.unwrap(), VerificationResult::MalformedData);
}

#[tokio::test(start_paused = true)]
async fn test_silent_peer_times_out() {
    let config = HandshakeConfig::new(Duration::from_secs(5), 1_024);
    let (_a_io, b_io) = duplex(1_024);
    let mut b_stream = packet_stream(b_io, &config);

    let err = session::authenticate(
        &mut b_stream,
        create_test_key_pair(),
        *create_test_key_pair().public_key(),
        OsChallengeSource,
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SessionError::Timeout(timeout) if timeout == Duration::from_secs(5)));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_second_leg_times_out() {
    let config = HandshakeConfig::new(Duration::from_millis(250), 1_024);
    let (a_io, b_io) = duplex(1_024);
    let mut a_stream = packet_stream(a_io, &config);
    let mut b_stream = packet_stream(b_io, &config);

    a_stream
        .send(server_challenge(challenge(1)).to_frame())
        .await
        .unwrap();

    let err = session::authenticate(
        &mut b_stream,
        create_test_key_pair(),
        *create_test_key_pair().public_key(),
        OsChallengeSource,
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SessionError::Timeout(_)));
}

#[tokio::test]
async fn test_hang_up_before_challenge_is_closed() {
    let config = HandshakeConfig::default();
    let (a_io, b_io) = duplex(1_024);
    let mut b_stream = packet_stream(b_io, &config);
    drop(a_io);

    let err = session::authenticate(
        &mut b_stream,
        create_test_key_pair(),
        *create_test_key_pair().public_key(),
        OsChallengeSource,
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SessionError::Closed));
}

#[tokio::test]
async fn test_oversized_frame_is_a_codec_error() {
    let small = HandshakeConfig::new(Duration::from_secs(5), 64);
    let (a_io, b_io) = duplex(1_024);
    let mut a_stream = packet_stream(a_io, &HandshakeConfig::default());
    let mut b_stream = packet_stream(b_io, &small);

    a_stream
        .send(server_challenge(challenge(1)).to_frame())
        .await
        .unwrap();

    let err = session::authenticate(
        &mut b_stream,
        create_test_key_pair(),
        *create_test_key_pair().public_key(),
        OsChallengeSource,
        &small,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Codec(CodecError::TooLarge { size: 72, max: 64 })
    ));
}

#[tokio::test]
async fn test_sessions_can_be_spawned() {
    let a = create_test_key_pair();
    let b = create_test_key_pair();
    let config = HandshakeConfig::default();

    let (a_io, b_io) = duplex(1_024);
    let mut a_stream = packet_stream(a_io, &config);
    let mut b_stream = packet_stream(b_io, &config);

    let responder = {
        let (a, b) = (a.clone(), b.clone());
        async move {
            session::authenticate(&mut b_stream, b, *a.public_key(), OsChallengeSource, &config)
                .await
        }
    };
    assert_send(&responder);

    let responder = tokio::spawn(responder);
    let a_result = session::challenge(
        &mut a_stream,
        a,
        *b.public_key(),
        OsChallengeSource,
        &config,
    )
    .await;

    assert_eq!(a_result.unwrap(), VerificationResult::Success);
    assert_eq!(responder.await.unwrap().unwrap(), VerificationResult::Success);
}
