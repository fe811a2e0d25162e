//! Sonos SOAP client against a mocked player.

mod helpers;

use std::net::Ipv4Addr;

use helpers::{
    browse_mock, fixture, http_client, port, soap_action, soap_mock, sonos_client, AV_TRANSPORT,
    CONTENT_DIRECTORY, RENDERING_CONTROL,
};
use mockito::{Matcher, Mock, Server};
use tunepoint_core::protocol_constants::DEFAULT_FAVORITES_ROOTS;
use tunepoint_core::{AudioDevice, DeviceError, DeviceFamily, DeviceProber, HttpProber};

/// Serves `FV:2` from `fv2_fixture` and an empty container for every other
/// favorites root.
async fn favorites_mocks(server: &mut Server, fv2_fixture: &str) -> Vec<Mock> {
    let mut mocks = Vec::new();
    for root in DEFAULT_FAVORITES_ROOTS {
        let body = if *root == "FV:2" {
            fixture(fv2_fixture)
        } else {
            fixture("sonos_browse_empty.xml")
        };
        mocks.push(browse_mock(server, root, &body).await);
    }
    mocks
}

#[tokio::test]
async fn probe_reads_identity_from_device_description() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(fixture("sonos_device_description.xml"))
        .create_async()
        .await;

    let prober = HttpProber::with_client(http_client(), port(&server), port(&server));
    let device = prober
        .probe(Ipv4Addr::LOCALHOST, DeviceFamily::Sonos)
        .await
        .expect("Sonos player should be recognised");

    assert_eq!(device.family, DeviceFamily::Sonos);
    assert_eq!(device.name, "Kitchen");
    assert_eq!(device.model, "Sonos One");
    assert_eq!(device.brand, "Sonos");

    // No BluOS endpoint on this server.
    assert!(prober.probe(Ipv4Addr::LOCALHOST, DeviceFamily::BluOs).await.is_none());
}

#[tokio::test]
async fn favorites_keep_only_radio_items() {
    let mut server = Server::new_async().await;
    let mocks = favorites_mocks(&mut server, "sonos_browse_fv2.xml").await;

    let presets = sonos_client(&server).list_presets().await.unwrap();

    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].id, 1);
    assert_eq!(presets[0].name, "Jazz FM");
    assert_eq!(presets[0].uri, "http://stream.example/radio");
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn favorites_are_cached_until_invalidated() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for root in DEFAULT_FAVORITES_ROOTS {
        let body = if *root == "FV:2" {
            fixture("sonos_browse_fv2.xml")
        } else {
            fixture("sonos_browse_empty.xml")
        };
        mocks.push(
            server
                .mock("POST", CONTENT_DIRECTORY)
                .match_header("SOAPAction", soap_action("Browse"))
                .match_body(Matcher::Regex(format!("<ObjectID>{}</ObjectID>", root)))
                .with_status(200)
                .with_body(body)
                .expect(2)
                .create_async()
                .await,
        );
    }

    let client = sonos_client(&server);
    client.list_presets().await.unwrap();
    client.list_presets().await.unwrap();
    client.invalidate_presets();
    client.list_presets().await.unwrap();

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn failing_containers_are_skipped() {
    let mut server = Server::new_async().await;
    browse_mock(&mut server, "FV:2", &fixture("sonos_browse_fv2.xml")).await;
    // Every other root falls through to mockito's 501.

    let presets = sonos_client(&server).list_presets().await.unwrap();
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, "Jazz FM");
}

#[tokio::test]
async fn placeholder_preset_is_rejected_without_requests() {
    let mut server = Server::new_async().await;
    let browses = favorites_mocks(&mut server, "sonos_browse_empty.xml").await;
    let transport = server
        .mock("POST", AV_TRANSPORT)
        .expect(0)
        .create_async()
        .await;

    let client = sonos_client(&server);
    let presets = client.list_presets().await.unwrap();
    assert_eq!(presets.len(), 2);
    assert!(presets.iter().all(|p| p.is_info()));

    let err = client.play_preset(1).await.unwrap_err();
    assert!(matches!(err, DeviceError::PresetNotPlayable { id: 1, .. }), "{err:?}");

    // One browse per root from list_presets, none from play_preset.
    for mock in browses {
        mock.assert_async().await;
    }
    transport.assert_async().await;
}

#[tokio::test]
async fn status_combines_transport_track_and_volume() {
    let mut server = Server::new_async().await;
    soap_mock(&mut server, AV_TRANSPORT, "GetTransportInfo", 200, &fixture("sonos_transport_info.xml")).await;
    soap_mock(&mut server, AV_TRANSPORT, "GetPositionInfo", 200, &fixture("sonos_position_info.xml")).await;
    soap_mock(&mut server, RENDERING_CONTROL, "GetVolume", 200, &fixture("sonos_volume.xml")).await;

    let status = sonos_client(&server).get_status().await.unwrap();
    assert_eq!(status.state, "playing");
    assert_eq!(status.title, "So What");
    assert_eq!(status.artist, "Miles Davis");
    assert_eq!(status.album, "Kind of Blue");
    assert_eq!(status.volume, 35);
}

#[tokio::test]
async fn status_degrades_to_stopped_when_transport_fails() {
    let mut server = Server::new_async().await;
    soap_mock(&mut server, AV_TRANSPORT, "GetTransportInfo", 500, "Internal Server Error").await;
    let position = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("GetPositionInfo"))
        .expect(0)
        .create_async()
        .await;
    let volume = server
        .mock("POST", RENDERING_CONTROL)
        .expect(0)
        .create_async()
        .await;

    let status = sonos_client(&server).get_status().await.unwrap();
    assert_eq!(status.state, "stopped");
    assert!(status.title.is_empty());
    assert!(status.artist.is_empty());
    assert!(status.album.is_empty());
    assert_eq!(status.volume, 0);

    position.assert_async().await;
    volume.assert_async().await;
}

#[tokio::test]
async fn status_keeps_state_when_position_fails() {
    let mut server = Server::new_async().await;
    soap_mock(&mut server, AV_TRANSPORT, "GetTransportInfo", 200, &fixture("sonos_transport_info.xml")).await;
    soap_mock(&mut server, AV_TRANSPORT, "GetPositionInfo", 500, &fixture("sonos_fault_714.xml")).await;

    let status = sonos_client(&server).get_status().await.unwrap();
    assert_eq!(status.state, "playing");
    assert!(status.title.is_empty());
    assert_eq!(status.volume, 0);
}

#[tokio::test]
async fn status_keeps_track_when_volume_fails() {
    let mut server = Server::new_async().await;
    soap_mock(&mut server, AV_TRANSPORT, "GetTransportInfo", 200, &fixture("sonos_transport_info.xml")).await;
    soap_mock(&mut server, AV_TRANSPORT, "GetPositionInfo", 200, &fixture("sonos_position_info.xml")).await;
    soap_mock(&mut server, RENDERING_CONTROL, "GetVolume", 500, "boom").await;

    let status = sonos_client(&server).get_status().await.unwrap();
    assert_eq!(status.title, "So What");
    assert_eq!(status.volume, 0);
}

#[tokio::test]
async fn direct_uri_then_play() {
    let mut server = Server::new_async().await;
    favorites_mocks(&mut server, "sonos_browse_fv2.xml").await;
    let set_uri = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("SetAVTransportURI"))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<CurrentURI>http://stream.example/radio</CurrentURI>".into()),
            Matcher::Regex("item id=&quot;FAVORITE&quot;".into()),
        ]))
        .with_status(200)
        .with_body(fixture("sonos_empty_response.xml"))
        .expect(1)
        .create_async()
        .await;
    let play = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("Play"))
        .match_body(Matcher::Regex("<Speed>1</Speed>".into()))
        .with_status(200)
        .with_body(fixture("sonos_empty_response.xml"))
        .expect(1)
        .create_async()
        .await;

    sonos_client(&server).play_preset(1).await.unwrap();

    set_uri.assert_async().await;
    play.assert_async().await;
}

#[tokio::test]
async fn rejected_stream_falls_back_to_queue() {
    let mut server = Server::new_async().await;
    favorites_mocks(&mut server, "sonos_browse_stream.xml").await;
    let ok = fixture("sonos_empty_response.xml");

    let set_uri = soap_mock(&mut server, AV_TRANSPORT, "SetAVTransportURI", 500, &fixture("sonos_fault_714.xml")).await;
    let clear = soap_mock(&mut server, AV_TRANSPORT, "RemoveAllTracksFromQueue", 200, &ok).await;
    // A failing optional step does not stop the sequence.
    let mode = soap_mock(&mut server, AV_TRANSPORT, "SetPlayMode", 500, "nope").await;
    let enqueue = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("AddURIToQueue"))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(
                "<EnqueuedURI>x-sonosapi-stream:s12345\\?sid=254&amp;flags=8224</EnqueuedURI>".into(),
            ),
            Matcher::Regex("<DesiredFirstTrackNumberEnqueued>1</DesiredFirstTrackNumberEnqueued>".into()),
        ]))
        .with_status(200)
        .with_body(&ok)
        .expect(1)
        .create_async()
        .await;
    let seek = soap_mock(&mut server, AV_TRANSPORT, "Seek", 200, &ok).await;
    let play = soap_mock(&mut server, AV_TRANSPORT, "Play", 200, &ok).await;

    sonos_client(&server).play_preset(1).await.unwrap();

    for mock in [set_uri, clear, mode, enqueue, seek, play] {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn failed_enqueue_aborts_fallback() {
    let mut server = Server::new_async().await;
    favorites_mocks(&mut server, "sonos_browse_stream.xml").await;
    let ok = fixture("sonos_empty_response.xml");

    soap_mock(&mut server, AV_TRANSPORT, "SetAVTransportURI", 500, "rejected").await;
    soap_mock(&mut server, AV_TRANSPORT, "RemoveAllTracksFromQueue", 200, &ok).await;
    soap_mock(&mut server, AV_TRANSPORT, "SetPlayMode", 200, &ok).await;
    soap_mock(&mut server, AV_TRANSPORT, "AddURIToQueue", 500, &fixture("sonos_fault_714.xml")).await;
    let seek = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("Seek"))
        .expect(0)
        .create_async()
        .await;
    let play = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("Play"))
        .expect(0)
        .create_async()
        .await;

    let err = sonos_client(&server).play_preset(1).await.unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert!(err.to_string().contains("714"), "{err}");

    seek.assert_async().await;
    play.assert_async().await;
}

#[tokio::test]
async fn rejected_non_stream_uri_is_not_retried() {
    let mut server = Server::new_async().await;
    favorites_mocks(&mut server, "sonos_browse_stream.xml").await;

    soap_mock(&mut server, AV_TRANSPORT, "SetAVTransportURI", 500, "rejected").await;
    let clear = server
        .mock("POST", AV_TRANSPORT)
        .match_header("SOAPAction", soap_action("RemoveAllTracksFromQueue"))
        .expect(0)
        .create_async()
        .await;

    // Preset 2 is a plain HTTP file stream.
    let err = sonos_client(&server).play_preset(2).await.unwrap_err();
    assert_eq!(err.http_status(), Some(500));
    clear.assert_async().await;
}

#[tokio::test]
async fn volume_is_sent_to_master_channel() {
    let mut server = Server::new_async().await;
    let set = server
        .mock("POST", RENDERING_CONTROL)
        .match_header("SOAPAction", soap_action("SetVolume"))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<Channel>Master</Channel>".into()),
            Matcher::Regex("<DesiredVolume>42</DesiredVolume>".into()),
        ]))
        .with_status(200)
        .with_body(fixture("sonos_empty_response.xml"))
        .expect(1)
        .create_async()
        .await;

    let client = sonos_client(&server);
    client.set_volume(42).await.unwrap();
    assert!(matches!(client.set_volume(101).await, Err(DeviceError::InvalidVolume(101))));

    set.assert_async().await;
}

#[tokio::test]
async fn grouping_is_refused_without_requests() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = sonos_client(&server);
    let err = client.add_slave(Ipv4Addr::new(192, 168, 1, 2)).await.unwrap_err();
    assert!(err.is_capability());
    assert!(client.leave_group().await.unwrap_err().is_capability());

    any.assert_async().await;
}

#[tokio::test]
async fn diagnostics_count_radio_favorites() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(fixture("sonos_device_description.xml"))
        .create_async()
        .await;
    soap_mock(&mut server, AV_TRANSPORT, "GetTransportInfo", 200, &fixture("sonos_transport_info.xml")).await;
    soap_mock(&mut server, RENDERING_CONTROL, "GetVolume", 200, &fixture("sonos_volume.xml")).await;
    browse_mock(&mut server, "0", &fixture("sonos_browse_empty.xml")).await;
    favorites_mocks(&mut server, "sonos_browse_stream.xml").await;

    let checks = sonos_client(&server).diagnostics().await;
    let summary: Vec<String> = checks.iter().map(ToString::to_string).collect();
    assert_eq!(
        summary,
        vec![
            "Device description: ok",
            "AVTransport: ok",
            "RenderingControl: ok",
            "ContentDirectory: ok",
            "Radio favorites (2 found): ok",
        ]
    );
}
