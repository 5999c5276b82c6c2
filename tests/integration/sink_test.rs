use hostpulse::core::health::{ClassifiedEvent, EventSink, State};
use hostpulse::sink::TcpJsonSink;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

fn event(name: &str, state: State, value: f64) -> ClassifiedEvent {
    ClassifiedEvent {
        name: name.to_string(),
        state,
        description: format!("{} is {}", name, value),
        value,
        ttl: Duration::from_secs(5),
    }
}

#[test]
fn test_tcp_sink_writes_json_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let reader = BufReader::new(stream);
        reader
            .lines()
            .take(2)
            .map(|line| serde_json::from_str::<serde_json::Value>(&line.unwrap()).unwrap())
            .collect::<Vec<_>>()
    });

    let sink = TcpJsonSink::new(endpoint).with_source_host("web-01");
    sink.emit(event("cpu", State::Warning, 0.91));
    sink.emit(event("memory", State::Ok, 0.4));

    let records = server.join().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["host"], "web-01");
    assert_eq!(records[0]["service"], "cpu");
    assert_eq!(records[0]["state"], "warning");
    assert_eq!(records[0]["metric"], 0.91);
    assert_eq!(records[0]["ttl"], 5.0);
    assert_eq!(records[1]["service"], "memory");
    assert_eq!(records[1]["state"], "ok");
}

#[test]
fn test_tcp_sink_survives_refused_connection() {
    // Bind then drop to get a port nobody listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let sink = TcpJsonSink::new(format!("127.0.0.1:{}", port));
    for _ in 0..3 {
        sink.emit(event("cpu", State::Ok, 0.1));
    }
}

#[test]
fn test_tcp_sink_survives_unresolvable_host() {
    let sink = TcpJsonSink::new("host.invalid:5555");
    sink.emit(event("cpu", State::Ok, 0.1));
}
