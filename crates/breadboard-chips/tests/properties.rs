//! Quantified behaviour of the chips.

use std::rc::Rc;

use breadboard_chips::{
    AluOutputs, DEFAULT_RAM_CAPACITY, FlagLayout, FlagsRegister, ProgramCounter, Ram, Register,
    SystemRegister,
};
use breadboard_core::test_utils::init_logging;
use breadboard_core::{
    Bus, BusConfig, Clock, Component, ControlLineId, ControlLines, Error, RangeError,
};
use proptest::prelude::*;

struct Board {
    clock: Clock,
    bus: Rc<Bus>,
    lines: ControlLines,
}

impl Board {
    fn new() -> Self {
        init_logging();
        Self {
            clock: Clock::new(),
            bus: Rc::new(Bus::new(BusConfig::default())),
            lines: ControlLines::new(),
        }
    }

    fn register(&mut self, id: SystemRegister) -> Rc<Register> {
        Register::new(id, &mut self.clock, &self.bus, &self.lines).unwrap()
    }

    fn pc(&mut self) -> Rc<ProgramCounter> {
        ProgramCounter::new(&mut self.clock, &self.bus, &self.lines).unwrap()
    }
}

fn system_register() -> impl Strategy<Value = SystemRegister> {
    prop::sample::select(SystemRegister::ALL.to_vec())
}

proptest! {
    #[test]
    fn counter_increments_by_one(start in 0u8..=254) {
        let mut board = Board::new();
        let pc = board.pc();
        pc.set_value(start);
        board.lines.set(ControlLineId::PcEnable, true).unwrap();

        board.clock.tick().unwrap();

        prop_assert_eq!(pc.value(), start + 1);
    }

    #[test]
    fn counter_load_beats_count(start in any::<u8>(), target in any::<u8>()) {
        let mut board = Board::new();
        let pc = board.pc();
        let a = board.register(SystemRegister::A);
        pc.set_value(start);
        a.set_value(target);
        for line in [ControlLineId::ARegOut, ControlLineId::PcIn, ControlLineId::PcEnable] {
            board.lines.set(line, true).unwrap();
        }

        board.clock.tick().unwrap();

        prop_assert_eq!(pc.value(), target);
    }

    #[test]
    fn register_bits_round_trip(
        register in system_register(),
        initial in any::<u8>(),
        bit in 0u8..8,
        on in any::<bool>(),
    ) {
        let mut board = Board::new();
        let reg = board.register(register);
        reg.set_value(initial);

        reg.set_bit(bit, on).unwrap();

        prop_assert_eq!(reg.get_bit(bit).unwrap(), on);
        let mask = 1 << bit;
        prop_assert_eq!(reg.value() & !mask, initial & !mask);
    }

    #[test]
    fn register_bits_past_seven_fail(bit in 8u8..) {
        let mut board = Board::new();
        let reg = board.register(SystemRegister::B);
        prop_assert_eq!(
            reg.set_bit(bit, true),
            Err(Error::Range(RangeError::Bit { bit, max: 7 }))
        );
        prop_assert_eq!(reg.value(), 0);
    }

    #[test]
    fn flag_bits_round_trip(initial in 0u8..16, bit in 0u8..4, on in any::<bool>()) {
        let mut board = Board::new();
        let alu = Rc::new(AluOutputs::default());
        let flags = FlagsRegister::new(&mut board.clock, &board.lines, alu, FlagLayout::default());
        for b in 0..4 {
            flags.set_bit(b, initial & (1 << b) != 0).unwrap();
        }
        prop_assert_eq!(flags.value(), initial);

        flags.set_bit(bit, on).unwrap();

        prop_assert_eq!(flags.get_bit(bit).unwrap(), on);
        let mask = 1 << bit;
        prop_assert_eq!(flags.value() & !mask, initial & !mask);
        prop_assert!(flags.value() <= 0b1111);
    }

    #[test]
    fn flag_bits_past_three_fail(bit in 4u8..) {
        let mut board = Board::new();
        let alu = Rc::new(AluOutputs::default());
        let flags = FlagsRegister::new(&mut board.clock, &board.lines, alu, FlagLayout::default());
        prop_assert_eq!(
            flags.get_bit(bit),
            Err(Error::Range(RangeError::Bit { bit, max: 3 }))
        );
    }

    #[test]
    fn flags_follow_alu(carry in any::<bool>(), zero in any::<bool>()) {
        let mut board = Board::new();
        let alu = Rc::new(AluOutputs::new(carry, zero));
        let flags = FlagsRegister::new(&mut board.clock, &board.lines, alu, FlagLayout::default());
        board.lines.set(ControlLineId::UpdateFlags, true).unwrap();

        board.clock.tick().unwrap();

        prop_assert_eq!(flags.value(), u8::from(carry) | (u8::from(zero) << 1));
    }

    #[test]
    fn ram_write_then_read(address in any::<u8>(), value in any::<u8>()) {
        let mut board = Board::new();
        let mar = board.register(SystemRegister::Mar);
        let ram = Ram::new(
            &mut board.clock,
            &board.bus,
            &board.lines,
            mar.clone(),
            DEFAULT_RAM_CAPACITY,
        )
        .unwrap();
        mar.set_value(address);

        ram.write(value);

        prop_assert_eq!(ram.read(), value);
        prop_assert_eq!(ram.read_at(address), value);
    }

    #[test]
    fn register_reset_zeroes(register in system_register(), value in any::<u8>()) {
        let mut board = Board::new();
        let reg = board.register(register);
        reg.set_value(value);

        reg.reset();

        prop_assert_eq!(reg.value(), 0);
        prop_assert!(!reg.is_driving());
    }

    #[test]
    fn only_one_driver_at_a_time(order in Just(vec![
        ControlLineId::PcOut,
        ControlLineId::ARegOut,
        ControlLineId::BRegOut,
        ControlLineId::IrParamOut,
    ]).prop_shuffle()) {
        let mut board = Board::new();
        let _pc = board.pc();
        for register in SystemRegister::ALL {
            board.register(register);
        }

        let mut raised = 0;
        for line in order {
            if board.lines.set(line, true).is_ok() {
                raised += 1;
            }
            prop_assert!(board.bus.driver().is_some());
        }

        // Every claim after the first is contention and is refused.
        prop_assert_eq!(raised, 1);
        let driving = board
            .clock
            .components()
            .iter()
            .filter(|c| board.bus.is_driven_by(c.id()))
            .count();
        prop_assert_eq!(driving, 1);
    }
}

#[test]
fn counter_wraps_to_zero() {
    let mut board = Board::new();
    let pc = board.pc();
    pc.set_value(255);
    board.lines.set(ControlLineId::PcEnable, true).unwrap();
    board.clock.tick().unwrap();
    assert_eq!(pc.value(), 0);
}

#[test]
fn every_chip_resets_to_zero() {
    let mut board = Board::new();
    let pc = board.pc();
    let registers: Vec<_> = SystemRegister::ALL
        .into_iter()
        .map(|r| board.register(r))
        .collect();
    let mar = registers[2].clone();
    let alu = Rc::new(AluOutputs::new(true, true));
    let flags = FlagsRegister::new(&mut board.clock, &board.lines, alu, FlagLayout::default());
    let ram = Ram::new(&mut board.clock, &board.bus, &board.lines, mar, DEFAULT_RAM_CAPACITY)
        .unwrap();

    pc.set_value(0x10);
    for (i, reg) in registers.iter().enumerate() {
        reg.set_value(0x20 + i as u8);
    }
    ram.write_at(0x20, 0xFF);
    board.lines.set(ControlLineId::UpdateFlags, true).unwrap();
    board.clock.tick().unwrap();
    board.lines.set(ControlLineId::UpdateFlags, false).unwrap();
    assert_eq!(flags.value(), 0b0011);

    board.clock.reset_components();

    for component in board.clock.components() {
        assert_eq!(component.value(), 0, "{} not cleared", component.name());
    }
    assert_eq!(ram.read_at(0x20), 0);
    assert_eq!(board.bus.driver(), None);
}
