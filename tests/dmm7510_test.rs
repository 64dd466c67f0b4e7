//! End-to-end driver behaviour against the scripted mock adapter.
//!
//! These tests assert the exact SCPI traffic the driver puts on the wire,
//! which is the contract that matters for an instrument the tests cannot
//! talk to.

use keithley_dmm7510::adapters::{MockAdapter, ScpiAdapter};
use keithley_dmm7510::{
    Dmm7510, Dmm7510Config, DmmError, InstrumentState, MeasurementMode, SensePrefix,
};

/// Session wired to a shared mock, already connected, no init traffic.
async fn connected_session() -> (Dmm7510, MockAdapter) {
    let mock = MockAdapter::new();
    let mut handle = mock.clone();
    handle.connect().await.unwrap();
    let dmm = Dmm7510::with_adapter(Dmm7510Config::default(), Box::new(mock.clone()));
    (dmm, mock)
}

/// Session taken through `initialize()` with a scripted VoltDC instrument.
async fn ready_session() -> (Dmm7510, MockAdapter) {
    let mock = MockAdapter::new();
    let mut dmm = Dmm7510::with_adapter(Dmm7510Config::default(), Box::new(mock.clone()));

    mock.push_response("KEITHLEY INSTRUMENTS,MODEL DMM7510,04089786,1.7.5b")
        .await;
    mock.push_response("\"VOLT:DC\"").await;
    mock.push_response("+1.234567890E-03").await;

    dmm.initialize().await.unwrap();
    mock.clear_commands().await;
    (dmm, mock)
}

#[tokio::test]
async fn initialize_resolves_mode_and_seeds_reading() {
    let (dmm, mock) = ready_session().await;

    assert_eq!(*dmm.state(), InstrumentState::Ready);
    assert_eq!(dmm.sense_prefix(), SensePrefix::Volt);

    let reading = dmm.last_reading().unwrap();
    assert!((reading.value - 1.234_567_890e-3).abs() < 1e-12);
}

#[tokio::test]
async fn initialize_issues_idn_mode_and_read_in_order() {
    let mock = MockAdapter::new();
    let mut dmm = Dmm7510::with_adapter(Dmm7510Config::default(), Box::new(mock.clone()));

    mock.push_response("KEITHLEY INSTRUMENTS,MODEL DMM7510,04089786,1.7.5b")
        .await;
    mock.push_response("\"CURR:AC\"").await;
    mock.push_response("0.5").await;

    dmm.initialize().await.unwrap();

    assert_eq!(mock.commands().await, vec!["*IDN?", "SENS:FUNC?", ":READ?"]);
    assert_eq!(dmm.sense_prefix(), SensePrefix::Curr);
}

#[tokio::test]
async fn none_function_falls_back_to_digitizer_query() {
    let (mut dmm, mock) = connected_session().await;

    mock.push_response("\"NONE\"").await;
    mock.push_response("\"CURR\"").await;

    let mode = dmm.resolve_mode().await.unwrap();

    assert_eq!(mode, Some(MeasurementMode::DigCurr));
    assert_eq!(dmm.sense_prefix(), SensePrefix::Dig);
    assert_eq!(mock.commands().await, vec!["SENS:FUNC?", "SENS:DIG:FUNC?"]);
}

#[tokio::test]
async fn unrecognized_function_disables_range_access() {
    let (mut dmm, mock) = connected_session().await;

    // Resistance is not part of the supported model.
    mock.push_response("\"RES\"").await;

    let mode = dmm.resolve_mode().await.unwrap();
    assert_eq!(mode, None);
    assert_eq!(dmm.sense_prefix(), SensePrefix::Dig);
    // No digitizer follow-up for a non-NONE reply.
    assert_eq!(mock.commands().await, vec!["SENS:FUNC?"]);
}

#[tokio::test]
async fn mode_write_retargets_range_commands_without_requery() {
    let (mut dmm, mock) = connected_session().await;

    dmm.set_measurement_mode(MeasurementMode::CurrDc)
        .await
        .unwrap();
    assert_eq!(dmm.sense_prefix(), SensePrefix::Curr);

    mock.push_response("1.0E-01").await;
    let range = dmm.range().await.unwrap();
    assert!((range - 0.1).abs() < 1e-12);

    assert_eq!(
        mock.commands().await,
        vec![":SENS:FUNC \"CURR:DC\"", "SENS:CURR:RANG?"]
    );
}

#[tokio::test]
async fn range_write_then_read_returns_instrument_snapped_value() {
    let (mut dmm, mock) = connected_session().await;
    dmm.set_measurement_mode(MeasurementMode::VoltDc)
        .await
        .unwrap();
    mock.clear_commands().await;

    dmm.set_range(7.3).await.unwrap();
    // The instrument autoselects the nearest supported range.
    mock.push_response("10").await;
    let range = dmm.range().await.unwrap();

    assert_eq!(
        mock.commands().await,
        vec!["SENS:VOLT:RANG 7.300000", "SENS:VOLT:RANG?"]
    );
    assert!((range - 10.0).abs() < 1e-12);
}

#[tokio::test]
async fn digitize_mode_gates_range_and_auto_range() {
    let (mut dmm, mock) = connected_session().await;
    dmm.set_measurement_mode(MeasurementMode::DigVolt)
        .await
        .unwrap();
    mock.clear_commands().await;

    assert!(dmm.range().await.unwrap().is_nan());
    dmm.set_range(10.0).await.unwrap();
    assert_eq!(dmm.auto_range().await.unwrap(), None);
    dmm.set_auto_range(true).await.unwrap();

    // Sentinel reads and no-op writes: nothing on the wire.
    assert!(mock.commands().await.is_empty());
}

#[tokio::test]
async fn auto_range_round_trip() {
    let (mut dmm, mock) = connected_session().await;
    dmm.set_measurement_mode(MeasurementMode::VoltAc)
        .await
        .unwrap();
    mock.clear_commands().await;

    dmm.set_auto_range(true).await.unwrap();
    dmm.set_auto_range(false).await.unwrap();
    mock.push_response("1").await;
    assert_eq!(dmm.auto_range().await.unwrap(), Some(true));
    mock.push_response("0").await;
    assert_eq!(dmm.auto_range().await.unwrap(), Some(false));

    assert_eq!(
        mock.commands().await,
        vec![
            "SENS:VOLT:RANG:AUTO 1",
            "SENS:VOLT:RANG:AUTO 0",
            "SENS:VOLT:RANG:AUTO?",
            "SENS:VOLT:RANG:AUTO?",
        ]
    );
}

#[tokio::test]
async fn auto_range_rejects_unexpected_reply() {
    let (mut dmm, mock) = connected_session().await;
    dmm.set_measurement_mode(MeasurementMode::VoltDc)
        .await
        .unwrap();

    mock.push_response("MAYBE").await;
    assert!(matches!(
        dmm.auto_range().await,
        Err(DmmError::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn duration_loop_loads_without_arming() {
    let (mut dmm, mock) = connected_session().await;

    dmm.trigger_duration_loop(2.5).await.unwrap();

    assert_eq!(
        mock.commands().await,
        vec!["TRIG:LOAD \"DurationLoop\", 2.500000, 0"]
    );

    dmm.initiate().await.unwrap();
    assert_eq!(
        mock.commands().await,
        vec!["TRIG:LOAD \"DurationLoop\", 2.500000, 0", "INIT"]
    );
}

#[tokio::test]
async fn external_trigger_emits_fixed_block_sequence() {
    let (mut dmm, mock) = connected_session().await;
    assert_eq!(dmm.config().digitize_count, 15);

    dmm.trigger_external(3).await.unwrap();

    assert_eq!(
        mock.commands().await,
        vec![
            ":TRIG:LOAD \"EMPTY\"",
            ":TRIG:BLOC:BUFF:CLEAR 1",
            ":TRIGger:BLOCk:WAIT 2, EXT, ENT",
            ":TRIG:EXT:IN:EDGE RIS",
            ":TRIG:BLOC:DEL:CONS 3, 0",
            ":TRIG:BLOC:DIGITIZE 4, \"defbuffer1\", 15",
            ":TRIG:BLOC:BRAN:COUN 5, 3, 2",
        ]
    );
}

#[tokio::test]
async fn standalone_trigger_commands() {
    let (mut dmm, mock) = connected_session().await;

    dmm.abort().await.unwrap();
    dmm.continuous().await.unwrap();
    dmm.clear_statistics().await.unwrap();
    dmm.clear_trace().await.unwrap();

    assert_eq!(
        mock.commands().await,
        vec![":TRIG:ABOR", "TRIG:CONT REST", ":TRAC:STAT:CLE", ":TRAC:CLE"]
    );
}

#[tokio::test]
async fn trigger_status_takes_text_before_semicolon() {
    let (mut dmm, mock) = connected_session().await;

    mock.push_response("WAITING;BLOCK2;0").await;
    assert_eq!(dmm.trigger_status().await.unwrap(), "WAITING");
    assert_eq!(mock.commands().await, vec![":TRIG:STAT?"]);
}

#[tokio::test]
async fn statistics_do_not_touch_mode_state() {
    let (mut dmm, mock) = connected_session().await;
    dmm.set_measurement_mode(MeasurementMode::VoltDc)
        .await
        .unwrap();
    mock.clear_commands().await;

    for reply in ["1.0e-3", "2.0e-4", "5.0e-5", "1000", "0.9e-3", "1.1e-3"] {
        mock.push_response(reply).await;
    }
    let stats = dmm.statistics().await.unwrap();

    assert!((stats.average - 1.0e-3).abs() < 1e-12);
    assert!((stats.span - 1000.0).abs() < 1e-9);
    assert_eq!(dmm.sense_prefix(), SensePrefix::Volt);
    assert_eq!(
        mock.commands().await,
        vec![
            ":TRAC:STAT:AVER?",
            ":TRAC:STAT:PK2P?",
            ":TRAC:STAT:STDD?",
            ":TRAC:ACT?",
            ":TRAC:STAT:MIN?",
            ":TRAC:STAT:MAX?",
        ]
    );
}

#[tokio::test]
async fn read_caches_last_value_fetch_does_not() {
    let (mut dmm, mock) = connected_session().await;

    mock.push_response("4.2").await;
    let value = dmm.read().await.unwrap();
    assert!((value - 4.2).abs() < 1e-12);
    assert!((dmm.last_reading().unwrap().value - 4.2).abs() < 1e-12);

    mock.push_response("9.9").await;
    let fetched = dmm.fetch().await.unwrap();
    assert!((fetched - 9.9).abs() < 1e-12);
    // Fetch is a live pass-through and leaves the cached reading alone.
    assert!((dmm.last_reading().unwrap().value - 4.2).abs() < 1e-12);

    assert_eq!(mock.commands().await, vec![":READ?", ":FETC?"]);
}

#[tokio::test]
async fn shutdown_clears_session_state() {
    let (mut dmm, _mock) = ready_session().await;

    dmm.shutdown().await.unwrap();

    assert_eq!(*dmm.state(), InstrumentState::Disconnected);
    assert_eq!(dmm.sense_prefix(), SensePrefix::Dig);
    assert!(dmm.last_reading().is_none());
    assert!(matches!(dmm.fetch().await, Err(DmmError::NotConnected)));
}
