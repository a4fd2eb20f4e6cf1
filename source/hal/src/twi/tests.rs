use super::*;
use crate::test_util::{run_to_completion, trace_init, BusEvent, MockBus};
use core::{future::Future, pin::pin, task::Poll};
use proptest::{collection::vec, prelude::*};

const ADDR: u8 = 0x50;
const REG: u8 = 0x10;

fn controller<'a>(bus: MockBus) -> Controller<'a, MockBus> {
    Controller::new(bus, ClockDivisor::default())
}

#[test]
fn accepted_write_starts_the_bus() {
    trace_init();
    let result = ResultCell::new();
    let data = [0xAA];
    let mut twi = controller(MockBus::new());

    let status = twi.request_write(ADDR, &data, &result);
    assert_eq!(status, RequestStatus::Accepted);
    assert_eq!(result.status(), TransferStatus::Processing);
    assert_eq!(twi.state(), State::Start);
    assert_eq!(twi.operation(), Some(Operation::Write));
    assert_eq!(twi.bus().events(), &[BusEvent::Start]);
}

#[test]
fn three_byte_write() {
    trace_init();
    let result = ResultCell::new();
    let data = [0xAA, 0xBB, 0xCC];
    let mut twi = controller(MockBus::new());
    assert!(twi.request_write(ADDR, &data, &result).is_accepted());

    // START transmitted: send SLA+W.
    twi.handle_interrupt();
    assert_eq!(twi.state(), State::SendSlaveAddressWrite);

    // SLA+W ACKed, then two data ACKs.
    for _ in 0..3 {
        twi.handle_interrupt();
    }
    assert_eq!(twi.handled_bytes(), 3);
    assert_eq!(result.status(), TransferStatus::Processing);

    // last data byte ACKed.
    twi.handle_interrupt();
    assert_eq!(result.status(), TransferStatus::Ok);
    assert!(twi.is_idle());
    assert_eq!(twi.handled_bytes(), 3);

    let bus = twi.release();
    assert_eq!(bus.written(), [0xA0, 0xAA, 0xBB, 0xCC]);
    assert_eq!(bus.events().last(), Some(&BusEvent::Stop));
    assert_eq!(bus.count(BusEvent::Stop), 1);
}

#[test]
fn register_write_sends_register_first() {
    trace_init();
    let result = ResultCell::new();
    let data = [0x01, 0x02];
    let mut twi = controller(MockBus::new());
    assert!(twi
        .request_write_register(ADDR, REG, &data, &result)
        .is_accepted());

    assert_eq!(run_to_completion(&mut twi), 5);
    assert_eq!(result.status(), TransferStatus::Ok);
    assert_eq!(twi.handled_bytes(), 2);
    assert_eq!(twi.bus().written(), [0xA0, REG, 0x01, 0x02]);
    assert_eq!(twi.bus().count(BusEvent::Stop), 1);
}

#[test]
fn register_read() {
    trace_init();
    let result = ResultCell::new();
    let mut buf = [0u8; 3];
    let bus = MockBus::new().with_rx(&[0x11, 0x22, 0x33]);
    let mut twi = controller(bus);
    assert!(twi
        .request_read_register(ADDR, REG, &mut buf, &result)
        .is_accepted());

    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::Ok);
    assert_eq!(twi.handled_bytes(), 3);

    let bus = twi.release();
    assert_eq!(
        bus.events(),
        &[
            BusEvent::Start,
            BusEvent::Write(0xA0),
            BusEvent::Write(REG),
            BusEvent::RepeatedStart,
            BusEvent::Write(0xA1),
            BusEvent::Ack,
            BusEvent::Read(0x11),
            BusEvent::Ack,
            BusEvent::Read(0x22),
            BusEvent::Nack,
            BusEvent::Read(0x33),
            BusEvent::Stop,
        ]
    );
    assert_eq!(buf, [0x11, 0x22, 0x33]);
}

#[test]
fn nacked_repeated_start() {
    trace_init();
    let result = ResultCell::new();
    let mut buf = [0u8; 2];
    // actions: START, SLA+W, register, repeated START.
    let bus = MockBus::new().fail_action(3, status::ARBITRATION_LOST);
    let mut twi = controller(bus);
    assert!(twi
        .request_read_register(ADDR, REG, &mut buf, &result)
        .is_accepted());

    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::RepeatedStartError);
    assert_eq!(twi.last_error_code(), status::ARBITRATION_LOST);
    assert_eq!(twi.handled_bytes(), 0);

    let bus = twi.release();
    assert_eq!(
        bus.events(),
        &[
            BusEvent::Start,
            BusEvent::Write(0xA0),
            BusEvent::Write(REG),
            BusEvent::RepeatedStart,
            BusEvent::Stop,
        ]
    );
}

#[test]
fn failures_are_classified_by_phase() {
    trace_init();
    let data = [0xAA, 0xBB];
    // (failing action, status, expected outcome)
    let cases = [
        (0, status::BUS_ERROR, TransferStatus::StartError),
        (1, status::ADDR_WRITE_NACKED, TransferStatus::SlaError),
        (2, status::TX_DATA_NACKED, TransferStatus::WriteError),
        (3, status::ARBITRATION_LOST, TransferStatus::WriteError),
    ];
    for (action, code, expected) in cases {
        let result = ResultCell::new();
        let mut twi = controller(MockBus::new().fail_action(action, code));
        assert!(twi
            .request_write_register(ADDR, REG, &data, &result)
            .is_accepted());
        run_to_completion(&mut twi);
        assert_eq!(result.status(), expected, "failing action {action}");
        assert_eq!(twi.last_error_code(), code);
        assert_eq!(twi.bus().count(BusEvent::Stop), 1);
    }
}

#[test]
fn nacked_read_address() {
    trace_init();
    let result = ResultCell::new();
    let mut buf = [0u8; 1];
    // actions: START, SLA+W, register, repeated START, SLA+R.
    let bus = MockBus::new().fail_action(4, status::ADDR_READ_NACKED);
    let mut twi = controller(bus);
    assert!(twi
        .request_read_register(ADDR, REG, &mut buf, &result)
        .is_accepted());

    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::SlaError);
    assert_eq!(twi.last_error_code(), status::ADDR_READ_NACKED);
}

#[test]
fn unexpected_status_while_reading() {
    trace_init();
    let result = ResultCell::new();
    let mut buf = [0u8; 3];
    // the first received byte reports a bus error instead of 0x50.
    let bus = MockBus::new()
        .with_rx(&[0x11, 0x22, 0x33])
        .fail_action(5, status::BUS_ERROR);
    let mut twi = controller(bus);
    assert!(twi
        .request_read_register(ADDR, REG, &mut buf, &result)
        .is_accepted());

    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::ReadError);
    assert_eq!(twi.handled_bytes(), 0);
    assert_eq!(twi.bus().count(BusEvent::Read(0x11)), 0);
    assert_eq!(twi.bus().count(BusEvent::Stop), 1);
}

#[test]
fn empty_write_probes_the_address() {
    trace_init();
    let result = ResultCell::new();
    let mut twi = controller(MockBus::new());
    assert!(twi.request_write(ADDR, &[], &result).is_accepted());

    assert_eq!(run_to_completion(&mut twi), 2);
    assert_eq!(result.status(), TransferStatus::Ok);
    assert_eq!(
        twi.bus().events(),
        &[BusEvent::Start, BusEvent::Write(0xA0), BusEvent::Stop]
    );
}

#[test]
fn busy_rejects_without_side_effects() {
    trace_init();
    let first = ResultCell::new();
    let second = ResultCell::new();
    let data = [0xAA, 0xBB, 0xCC];
    let mut buf = [0u8; 2];
    let mut twi = controller(MockBus::new());
    assert!(twi.request_write(ADDR, &data, &first).is_accepted());
    twi.handle_interrupt();
    twi.handle_interrupt();

    let state = twi.state();
    let handled = twi.handled_bytes();
    let events = twi.bus().events().len();

    let status = twi.request_read_register(0x23, REG, &mut buf, &second);
    assert_eq!(status, RequestStatus::Busy);
    assert_eq!(twi.state(), state);
    assert_eq!(twi.handled_bytes(), handled);
    assert_eq!(twi.operation(), Some(Operation::Write));
    assert_eq!(twi.bus().events().len(), events);
    assert_eq!(second.status(), TransferStatus::Ok);
    assert_eq!(first.status(), TransferStatus::Processing);

    run_to_completion(&mut twi);
    assert_eq!(first.status(), TransferStatus::Ok);
    assert_eq!(second.status(), TransferStatus::Ok);
    assert_eq!(twi.bus().written(), [0xA0, 0xAA, 0xBB, 0xCC]);
}

#[test]
fn init_only_reconfigures_the_clock() {
    trace_init();
    let divisor = ClockDivisor {
        bit_rate: 12,
        prescaler: Prescaler::P1,
    };
    let bus = MockBus::new().fail_action(1, status::ADDR_WRITE_NACKED);
    let mut twi = Controller::new(bus, divisor);

    // leave a failure behind first.
    let result = ResultCell::new();
    assert!(twi.request_write(ADDR, &[1], &result).is_accepted());
    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::SlaError);
    let events = twi.bus().events().len();

    twi.init();
    twi.init();
    assert!(twi.is_idle());
    assert_eq!(twi.last_error_code(), status::ADDR_WRITE_NACKED);
    assert_eq!(result.status(), TransferStatus::SlaError);
    assert_eq!(
        &twi.bus().events()[events..],
        &[BusEvent::Configure(divisor), BusEvent::Configure(divisor)]
    );
}

#[test]
fn spurious_interrupt_while_idle() {
    trace_init();
    let mut twi = controller(MockBus::new());
    twi.handle_interrupt();
    assert!(twi.is_idle());
    assert_eq!(twi.bus().events(), &[BusEvent::Stop]);
    assert_eq!(twi.last_error_code(), status::NO_INFO);
}

#[test]
fn submit_and_take_buffer() {
    trace_init();
    let result = ResultCell::new();
    let mut buf = [0u8; 2];
    let mut twi = controller(MockBus::new().with_rx(&[0xDE, 0xAD]));

    let request = Request::read_register(ADDR, REG, &mut buf).unwrap();
    assert!(twi.submit(request, &result).is_ok());
    assert!(twi.take_buffer().is_none(), "buffer is in use");

    // a second request is handed back while the first is in flight.
    let data = [0x01];
    let other = Request::write(ADDR, &data).unwrap();
    let other = twi.submit(other, &result).unwrap_err();
    assert_eq!(other.len(), 1);

    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::Ok);
    match twi.take_buffer() {
        Some(Buffer::Read(buf)) => assert_eq!(buf, &[0xDE, 0xAD]),
        buffer => panic!("expected the read buffer, got {buffer:?}"),
    }
    assert!(twi.take_buffer().is_none());

    assert!(twi.submit(other, &result).is_ok());
    run_to_completion(&mut twi);
    assert_eq!(result.status(), TransferStatus::Ok);
}

#[test]
fn wait_for_completion() {
    trace_init();
    let result = ResultCell::new();
    let data = [0xAA, 0xBB];
    let mut twi = controller(MockBus::new());
    assert!(twi.request_write(ADDR, &data, &result).is_accepted());

    let waker = futures::task::noop_waker();
    let mut cx = core::task::Context::from_waker(&waker);
    let mut wait = pin!(result.wait());
    assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);

    twi.handle_interrupt();
    assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);

    run_to_completion(&mut twi);
    assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
}

#[test]
fn shared_controller_driven_from_another_thread() {
    static TWI: SharedTwi<MockBus> = SharedTwi::new();
    static RESULT: ResultCell = ResultCell::new();
    static DATA: [u8; 4] = [1, 2, 3, 4];

    trace_init();
    assert!(TWI.with(|twi| twi.is_idle()).is_none());
    TWI.handle_interrupt();

    assert!(TWI.install(controller(MockBus::new())).is_none());
    let status = TWI.with(|twi| twi.request_write(ADDR, &DATA, &RESULT));
    assert_eq!(status, Some(RequestStatus::Accepted));

    let isr = std::thread::spawn(|| {
        while TWI.with(|twi| !twi.is_idle()) == Some(true) {
            TWI.handle_interrupt();
        }
    });
    let outcome = futures::executor::block_on(RESULT.wait());
    isr.join().unwrap();

    assert_eq!(outcome, Ok(()));
    let written = TWI.with(|twi| twi.bus().written());
    assert_eq!(written, Some(vec![0xA0, 1, 2, 3, 4]));
}

proptest! {
    #[test]
    fn idle_write_is_accepted(address in 0u8..=0x7f, data in vec(any::<u8>(), 1..=255)) {
        let result = ResultCell::new();
        let mut twi = controller(MockBus::new());
        prop_assert_eq!(twi.request_write(address, &data, &result), RequestStatus::Accepted);
        prop_assert_eq!(result.status(), TransferStatus::Processing);
        prop_assert_eq!(twi.bus().count(BusEvent::Start), 1);
        prop_assert_eq!(twi.bus().events().len(), 1);
    }

    #[test]
    fn acked_write_sends_every_byte(data in vec(any::<u8>(), 1..=255)) {
        let result = ResultCell::new();
        let mut twi = controller(MockBus::new());
        prop_assert!(twi.request_write(ADDR, &data, &result).is_accepted());
        run_to_completion(&mut twi);

        prop_assert_eq!(result.status(), TransferStatus::Ok);
        prop_assert_eq!(twi.handled_bytes(), data.len());
        let written = twi.bus().written();
        prop_assert_eq!(&written[1..], &data[..]);
        prop_assert_eq!(twi.bus().count(BusEvent::Stop), 1);
    }

    #[test]
    fn nack_stops_the_write(
        (data, k) in vec(any::<u8>(), 1..=255)
            .prop_flat_map(|data| { let len = data.len(); (Just(data), 0..len) })
    ) {
        let result = ResultCell::new();
        // actions: START, SLA+W, then one per data byte.
        let bus = MockBus::new().fail_action(2 + k, status::TX_DATA_NACKED);
        let mut twi = controller(bus);
        prop_assert!(twi.request_write(ADDR, &data, &result).is_accepted());
        run_to_completion(&mut twi);

        prop_assert_eq!(result.status(), TransferStatus::WriteError);
        prop_assert_eq!(twi.last_error_code(), status::TX_DATA_NACKED);
        let written = twi.bus().written();
        prop_assert_eq!(&written[1..], &data[..=k]);
        prop_assert_eq!(twi.bus().count(BusEvent::Stop), 1);
        prop_assert_eq!(twi.bus().events().last(), Some(&BusEvent::Stop));
    }

    #[test]
    fn read_acks_all_but_the_last(rx in vec(any::<u8>(), 1..=255)) {
        let result = ResultCell::new();
        let mut buf = vec![0u8; rx.len()];
        let mut twi = controller(MockBus::new().with_rx(&rx));
        prop_assert!(twi.request_read_register(ADDR, REG, &mut buf, &result).is_accepted());
        run_to_completion(&mut twi);
        prop_assert_eq!(result.status(), TransferStatus::Ok);

        let bus = twi.release();
        let events = bus.events();
        prop_assert_eq!(
            &events[..5],
            &[
                BusEvent::Start,
                BusEvent::Write(0xA0),
                BusEvent::Write(REG),
                BusEvent::RepeatedStart,
                BusEvent::Write(0xA1),
            ]
        );
        let last = rx.len() - 1;
        for (i, pair) in events[5..events.len() - 1].chunks(2).enumerate() {
            let arm = if i == last { BusEvent::Nack } else { BusEvent::Ack };
            prop_assert_eq!(pair, &[arm, BusEvent::Read(rx[i])]);
        }
        prop_assert_eq!(events.len(), 5 + 2 * rx.len() + 1);
        prop_assert_eq!(events.last(), Some(&BusEvent::Stop));
        prop_assert_eq!(buf, rx);
    }

    #[test]
    fn busy_at_any_point(steps in 0usize..6) {
        let first = ResultCell::new();
        let second = ResultCell::new();
        let data = [0xAA, 0xBB, 0xCC];
        let mut twi = controller(MockBus::new());
        prop_assert!(twi.request_write(ADDR, &data, &first).is_accepted());
        for _ in 0..steps {
            twi.handle_interrupt();
        }
        prop_assume!(!twi.is_idle());

        let state = twi.state();
        let handled = twi.handled_bytes();
        prop_assert_eq!(twi.request_write(ADDR, &data, &second), RequestStatus::Busy);
        prop_assert_eq!(twi.state(), state);
        prop_assert_eq!(twi.handled_bytes(), handled);
        prop_assert_eq!(second.status(), TransferStatus::Ok);
        prop_assert_eq!(twi.bus().count(BusEvent::Start), 1);
    }
}
