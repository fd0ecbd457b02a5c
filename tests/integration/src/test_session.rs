//! MQTT session integration tests over the stream bridge.

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use iotws_mqtt::{MqttError, QoS};

    use crate::device_client;

    type Inbox = Rc<RefCell<Vec<(String, Vec<u8>)>>>;

    fn inbox_callback(inbox: &Inbox) -> impl FnMut(&str, &[u8]) + 'static {
        let inbox = Rc::clone(inbox);
        move |topic: &str, payload: &[u8]| inbox.borrow_mut().push((topic.to_owned(), payload.to_vec()))
    }

    #[test]
    fn test_should_establish_session() {
        let mut client = device_client("connect");
        client.connect().unwrap();
        assert!(client.is_connected());

        let connect = &client.stream().transport().received[0];
        assert_eq!(connect[0], 0x10);
        // protocol name, then level 4
        assert_eq!(&connect[2..8], b"\x00\x04MQTT");
        assert_eq!(connect[8], 4);
    }

    #[test]
    fn test_should_surface_broker_refusal() {
        let mut client = device_client("refused");
        client.stream_mut().transport_mut().connack_code = 5;
        assert!(matches!(client.connect(), Err(MqttError::ConnectionRefused(5))));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_should_echo_published_message_to_subscriber() {
        let inbox = Inbox::default();
        let mut client = device_client("echo");
        client.connect().unwrap();
        client
            .subscribe("things/lamp/state", QoS::AtMostOnce, inbox_callback(&inbox))
            .unwrap();
        client
            .publish("things/lamp/state", br#"{"on":true}"#, QoS::AtMostOnce, false)
            .unwrap();
        client.yield_now().unwrap();

        assert_eq!(
            *inbox.borrow(),
            vec![("things/lamp/state".to_owned(), br#"{"on":true}"#.to_vec())]
        );
    }

    #[test]
    fn test_should_send_payload_without_terminator() {
        let mut client = device_client("payload");
        client.connect().unwrap();
        client.publish("t", b"abc", QoS::AtMostOnce, false).unwrap();

        let publish = client.stream().transport().received.last().cloned().unwrap();
        assert!(publish.ends_with(b"abc"));
    }

    #[test]
    fn test_should_reassemble_packets_split_across_frames() {
        let inbox = Inbox::default();
        let mut client = device_client("split");
        client.stream_mut().transport_mut().chunk = Some(3);
        client.connect().unwrap();
        client
            .subscribe("sensors/temp", QoS::AtMostOnce, inbox_callback(&inbox))
            .unwrap();

        client
            .stream_mut()
            .transport_mut()
            .inject_publish("sensors/temp", b"21.5");
        client.yield_now().unwrap();
        assert_eq!(inbox.borrow().len(), 1);
        assert_eq!(inbox.borrow()[0].1, b"21.5");
    }

    #[test]
    fn test_should_stop_routing_after_unsubscribe() {
        let inbox = Inbox::default();
        let mut client = device_client("unsub");
        client.connect().unwrap();
        client
            .subscribe("t", QoS::AtMostOnce, inbox_callback(&inbox))
            .unwrap();
        client.unsubscribe("t").unwrap();

        client.stream_mut().transport_mut().inject_publish("t", b"late");
        client.yield_now().unwrap();
        assert!(inbox.borrow().is_empty());
        assert!(client.stream().transport().subscriptions.is_empty());
    }

    #[test]
    fn test_should_notice_broker_drop() {
        let mut client = device_client("drop");
        client.connect().unwrap();
        client.stream_mut().transport_mut().inject_publish("t", b"lost");
        client.stream_mut().transport_mut().drop_connection();

        assert!(matches!(client.yield_now(), Err(MqttError::NotConnected)));
        assert!(!client.is_connected());
        assert_eq!(client.stream_mut().available(), 0);
    }

    #[test]
    fn test_should_reconnect_after_disconnect() {
        let mut client = device_client("reconnect");
        client.connect().unwrap();
        client.disconnect();
        assert!(!client.is_connected());
        assert!(!client.stream().transport().is_connected());

        client.connect().unwrap();
        assert!(client.is_connected());
        let handshakes = &client.stream().transport().handshakes;
        assert_eq!(handshakes.len(), 2);
        assert_eq!(handshakes[0], handshakes[1]);
    }
}
