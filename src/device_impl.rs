use crate::calibration::Calibration;
use crate::compensation::FineTemperature;
use crate::hw_def::*;
use crate::types::*;

use embedded_hal::{delay::DelayNs, i2c::I2c};

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        use defmt::{trace, warn};
    } else if #[cfg(feature = "log")] {
        use log::{trace, warn};
    }
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

impl<I2C, Delay, E> Bme280<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: DelayNs,
{
    /// Create a new BME280 driver instance
    ///
    /// The driver starts uninitialized; call [`Self::init`] before [`Self::read`].
    pub fn new(i2c: I2C, delay: Delay, i2c_addr: I2cAddr) -> Self {
        Self { i2c, delay, i2c_addr, state: DeviceState::default() }
    }

    /// Destroy the driver and return the bus and delay
    pub fn release(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    fn read_bytes(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c.write_read(self.i2c_addr.as_u8(), &[reg], buf).map_err(Error::I2c)?;
        trace!("bme280::read_bytes(): reg=0x{:02x} buf={:?}", reg, buf);
        Ok(())
    }

    fn read_byte(&mut self, reg: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8; 1];
        self.read_bytes(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), Error<E>> {
        trace!("bme280::write_byte(): reg=0x{:02x} value=0x{:02x}", reg, value);
        self.i2c.write(self.i2c_addr.as_u8(), &[reg, value]).map_err(Error::I2c)
    }

    fn read_bits(&mut self, field: BitField) -> Result<u8, Error<E>> {
        Ok(field.extract(self.read_byte(field.reg)?))
    }

    fn write_bits(&mut self, field: BitField, value: u8) -> Result<(), Error<E>> {
        let reg_value = self.read_byte(field.reg)?;
        self.write_byte(field.reg, field.insert(reg_value, value))
    }

    /// Verify the chip ID, configure ×1 oversampling on all channels in normal mode and load the calibration
    ///
    /// An identity mismatch leaves the driver state untouched. Any later failure leaves the
    /// driver uninitialized, dropping calibration from an earlier `init()`.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        let chip_id = self.chip_id()?;
        if chip_id != CHIP_ID {
            warn!("bme280::init(): unexpected chip id 0x{:02x}", chip_id);
            return Err(Error::IdentityMismatch(chip_id));
        }

        self.state.reset();
        self.set_pressure_oversampling(Oversampling::X1)?;
        self.set_temperature_oversampling(Oversampling::X1)?;
        self.set_humidity_oversampling(Oversampling::X1)?;
        self.set_power_mode(PowerMode::Normal)?;

        self.load_calibration()
    }

    /// Read the chip identity register
    pub fn chip_id(&mut self) -> Result<u8, Error<E>> {
        self.read_byte(REG_ID)
    }

    /// Software reset; waits for the device start-up time
    ///
    /// The driver returns to the uninitialized state.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_byte(REG_RESET, SOFT_RESET_MAGIC)?;
        self.delay.delay_ms(STARTUP_TIME_MS);
        self.state.reset();
        Ok(())
    }

    /// Read both calibration blocks and commit them once both reads succeeded
    pub fn load_calibration(&mut self) -> Result<(), Error<E>> {
        let mut tp = [0u8; CALIB00_LEN];
        let mut h = [0u8; CALIB26_LEN];
        self.read_bytes(REG_CALIB00, &mut tp)?;
        self.read_bytes(REG_CALIB26, &mut h)?;
        self.state.calibration = Some(Calibration::from_blocks(&tp, &h));
        Ok(())
    }

    /// Calibration constants, if loaded
    pub fn calibration(&self) -> Option<&Calibration> {
        self.state.calibration.as_ref()
    }

    /// Whether the calibration has been loaded
    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    /// Fine temperature computed by the last read cycle
    pub fn fine_temperature(&self) -> FineTemperature {
        self.state.t_fine
    }

    /// Get the compensation formula family used by [`Self::read`]
    pub fn compensation_mode(&self) -> CompensationMode {
        self.state.compensation_mode
    }

    /// Select the compensation formula family used by [`Self::read`]
    pub fn set_compensation_mode(&mut self, mode: CompensationMode) {
        self.state.compensation_mode = mode;
    }

    /// Burst read the latest ADC codes without compensating them
    pub fn read_raw(&mut self) -> Result<RawSample, Error<E>> {
        let mut buf = [0u8; MEASUREMENT_LEN];
        self.read_bytes(REG_PRESS_MSB, &mut buf)?;
        Ok(RawSample::from_burst(&buf))
    }

    /// Read and compensate temperature, pressure and humidity
    pub fn read(&mut self) -> Result<Measurement, Error<E>> {
        if !self.state.is_initialized() {
            return Err(Error::Uninitialized);
        }
        let raw = self.read_raw()?;
        self.state.measurement(&raw)
    }

    /// Whether a conversion is running
    pub fn is_measuring(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_bits(FIELD_MEASURING)? != 0)
    }

    /// Get temperature oversampling
    pub fn temperature_oversampling(&mut self) -> Result<Oversampling, Error<E>> {
        Ok(self.read_bits(FIELD_OSRS_T)?.into())
    }

    /// Set temperature oversampling
    pub fn set_temperature_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<E>> {
        self.write_bits(FIELD_OSRS_T, oversampling.bits())
    }

    /// Get pressure oversampling
    pub fn pressure_oversampling(&mut self) -> Result<Oversampling, Error<E>> {
        Ok(self.read_bits(FIELD_OSRS_P)?.into())
    }

    /// Set pressure oversampling
    pub fn set_pressure_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<E>> {
        self.write_bits(FIELD_OSRS_P, oversampling.bits())
    }

    /// Get humidity oversampling
    pub fn humidity_oversampling(&mut self) -> Result<Oversampling, Error<E>> {
        Ok(self.read_bits(FIELD_OSRS_H)?.into())
    }

    /// Set humidity oversampling
    pub fn set_humidity_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<E>> {
        self.write_bits(FIELD_OSRS_H, oversampling.bits())?;
        // ctrl_hum only takes effect after a write to ctrl_meas
        let ctrl_meas = self.read_byte(REG_CTRL_MEAS)?;
        self.write_byte(REG_CTRL_MEAS, ctrl_meas)
    }

    /// Get power mode
    pub fn power_mode(&mut self) -> Result<PowerMode, Error<E>> {
        Ok(self.read_bits(FIELD_MODE)?.into())
    }

    /// Set power mode
    pub fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<E>> {
        self.write_bits(FIELD_MODE, mode.bits())
    }

    /// Get standby time of normal mode
    pub fn standby_time(&mut self) -> Result<StandbyTime, Error<E>> {
        Ok(self.read_bits(FIELD_T_SB)?.into())
    }

    /// Set standby time of normal mode
    pub fn set_standby_time(&mut self, standby: StandbyTime) -> Result<(), Error<E>> {
        self.write_bits(FIELD_T_SB, standby.bits())
    }

    /// Get IIR filter coefficient
    pub fn filter(&mut self) -> Result<Filter, Error<E>> {
        Ok(self.read_bits(FIELD_FILTER)?.into())
    }

    /// Set IIR filter coefficient
    pub fn set_filter(&mut self, filter: Filter) -> Result<(), Error<E>> {
        self.write_bits(FIELD_FILTER, filter.bits())
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use crate::calibration::tests::{CALIB00, CALIB26, datasheet_calibration};

    use alloc::{vec, vec::Vec};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction},
    };

    const ADDR: u8 = 0x76;
    const BURST: [u8; MEASUREMENT_LEN] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30];

    fn read_reg(reg: u8, value: u8) -> Transaction {
        Transaction::write_read(ADDR, vec![reg], vec![value])
    }

    fn write_reg(reg: u8, value: u8) -> Transaction {
        Transaction::write(ADDR, vec![reg, value])
    }

    /// Bus traffic of a successful `init()` starting from reset register values
    fn init_transactions() -> Vec<Transaction> {
        vec![
            read_reg(0xD0, 0x60),
            // pressure oversampling ×1
            read_reg(0xF4, 0x00),
            write_reg(0xF4, 0b000_001_00),
            // temperature oversampling ×1
            read_reg(0xF4, 0b000_001_00),
            write_reg(0xF4, 0b001_001_00),
            // humidity oversampling ×1, latched by rewriting ctrl_meas
            read_reg(0xF2, 0x00),
            write_reg(0xF2, 0b001),
            read_reg(0xF4, 0b001_001_00),
            write_reg(0xF4, 0b001_001_00),
            // normal mode
            read_reg(0xF4, 0b001_001_00),
            write_reg(0xF4, 0b001_001_11),
            Transaction::write_read(ADDR, vec![0x88], CALIB00.to_vec()),
            Transaction::write_read(ADDR, vec![0xE1], CALIB26.to_vec()),
        ]
    }

    fn new_device(expectations: &[Transaction]) -> (Bme280<I2cMock, NoopDelay>, I2cMock) {
        let i2c = I2cMock::new(expectations);
        (Bme280::new(i2c.clone(), NoopDelay::new(), I2cAddr::Primary), i2c)
    }

    #[test]
    fn init() {
        let (mut bme, mut i2c) = new_device(&init_transactions());
        assert!(!bme.is_initialized());
        bme.init().unwrap();
        assert!(bme.is_initialized());
        assert_eq!(bme.calibration(), Some(&datasheet_calibration()));
        i2c.done();
    }

    #[test]
    fn init_identity_mismatch() {
        let (mut bme, mut i2c) = new_device(&[read_reg(0xD0, 0x58)]);
        assert_eq!(bme.init(), Err(Error::IdentityMismatch(0x58)));
        assert!(!bme.is_initialized());
        i2c.done();
    }

    #[test]
    fn init_propagates_configuration_errors() {
        let expectations = [
            read_reg(0xD0, 0x60),
            read_reg(0xF4, 0x00),
            write_reg(0xF4, 0b000_001_00).with_error(ErrorKind::Other),
        ];
        let (mut bme, mut i2c) = new_device(&expectations);
        assert_eq!(bme.init(), Err(Error::I2c(ErrorKind::Other)));
        assert!(!bme.is_initialized());
        i2c.done();
    }

    #[test]
    fn failed_reinit_drops_calibration() {
        let mut expectations = init_transactions();
        expectations.extend([
            read_reg(0xD0, 0x60),
            read_reg(0xF4, 0b001_001_11),
            write_reg(0xF4, 0b001_001_11).with_error(ErrorKind::Other),
        ]);
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.init().unwrap();
        assert!(bme.is_initialized());
        assert_eq!(bme.init(), Err(Error::I2c(ErrorKind::Other)));
        assert!(!bme.is_initialized());
        assert_eq!(bme.read(), Err(Error::Uninitialized));
        i2c.done();
    }

    #[test]
    fn reinit_identity_mismatch_keeps_calibration() {
        let mut expectations = init_transactions();
        expectations.push(read_reg(0xD0, 0x58));
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.init().unwrap();
        assert_eq!(bme.init(), Err(Error::IdentityMismatch(0x58)));
        assert_eq!(bme.calibration(), Some(&datasheet_calibration()));
        i2c.done();
    }

    #[test]
    fn calibration_not_committed_on_partial_read() {
        let expectations = [
            Transaction::write_read(ADDR, vec![0x88], CALIB00.to_vec()),
            Transaction::write_read(ADDR, vec![0xE1], vec![0; CALIB26_LEN]).with_error(ErrorKind::Other),
        ];
        let (mut bme, mut i2c) = new_device(&expectations);
        assert_eq!(bme.load_calibration(), Err(Error::I2c(ErrorKind::Other)));
        assert_eq!(bme.calibration(), None);
        i2c.done();
    }

    #[test]
    fn read_before_init() {
        let (mut bme, mut i2c) = new_device(&[]);
        assert_eq!(bme.read(), Err(Error::Uninitialized));
        assert_eq!(bme.fine_temperature(), FineTemperature(0));
        i2c.done();
    }

    #[test]
    fn read_fixed_point() {
        let mut expectations = init_transactions();
        expectations.push(Transaction::write_read(ADDR, vec![0xF7], BURST.to_vec()));
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.init().unwrap();

        let measurement = bme.read().unwrap();
        assert!((measurement.centigrade - 25.08).abs() < 0.001);
        assert!((measurement.pressure_hpa - 1006.5325).abs() < 0.01);
        assert!((measurement.humidity_percent - 54.997).abs() < 0.001);
        assert_eq!(bme.fine_temperature(), FineTemperature(128_422));
        i2c.done();
    }

    #[test]
    fn read_floating_point() {
        let mut expectations = init_transactions();
        expectations.push(Transaction::write_read(ADDR, vec![0xF7], BURST.to_vec()));
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.init().unwrap();
        bme.set_compensation_mode(CompensationMode::FloatingPoint);
        assert_eq!(bme.compensation_mode(), CompensationMode::FloatingPoint);

        let measurement = bme.read().unwrap();
        assert!((measurement.centigrade - 25.0825).abs() < 0.001);
        assert!((measurement.pressure_hpa - 1006.5326).abs() < 0.01);
        assert!((measurement.humidity_percent - 55.0007).abs() < 0.001);
        i2c.done();
    }

    #[test]
    fn read_bus_error() {
        let mut expectations = init_transactions();
        expectations.push(Transaction::write_read(ADDR, vec![0xF7], vec![0; MEASUREMENT_LEN]).with_error(ErrorKind::Other));
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.init().unwrap();
        assert_eq!(bme.read(), Err(Error::I2c(ErrorKind::Other)));
        i2c.done();
    }

    #[test]
    fn read_raw() {
        let (mut bme, mut i2c) = new_device(&[Transaction::write_read(ADDR, vec![0xF7], BURST.to_vec())]);
        assert_eq!(
            bme.read_raw().unwrap(),
            RawSample { temperature: 519_888, pressure: 415_148, humidity: 30_000 }
        );
        i2c.done();
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut expectations = init_transactions();
        expectations.push(write_reg(0xE0, 0xB6));
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.init().unwrap();
        bme.reset().unwrap();
        assert!(!bme.is_initialized());
        i2c.done();
    }

    #[test]
    fn oversampling_accessors() {
        let expectations = [
            read_reg(0xF4, 0b101_011_11),
            read_reg(0xF4, 0b101_011_11),
            read_reg(0xF2, 0b0000_0010),
            read_reg(0xF4, 0b101_011_11),
            write_reg(0xF4, 0b100_011_11),
            read_reg(0xF4, 0b100_011_11),
            write_reg(0xF4, 0b100_000_11),
        ];
        let (mut bme, mut i2c) = new_device(&expectations);
        assert_eq!(bme.temperature_oversampling().unwrap(), Oversampling::X16);
        assert_eq!(bme.pressure_oversampling().unwrap(), Oversampling::X4);
        assert_eq!(bme.humidity_oversampling().unwrap(), Oversampling::X2);
        bme.set_temperature_oversampling(Oversampling::X8).unwrap();
        bme.set_pressure_oversampling(Oversampling::Skipped).unwrap();
        i2c.done();
    }

    #[test]
    fn humidity_oversampling_rewrites_ctrl_meas() {
        let expectations = [
            read_reg(0xF2, 0b1111_1000),
            write_reg(0xF2, 0b1111_1101),
            read_reg(0xF4, 0b010_010_01),
            write_reg(0xF4, 0b010_010_01),
        ];
        let (mut bme, mut i2c) = new_device(&expectations);
        bme.set_humidity_oversampling(Oversampling::X16).unwrap();
        i2c.done();
    }

    #[test]
    fn mode_and_config_accessors() {
        let expectations = [
            read_reg(0xF4, 0b001_001_10),
            read_reg(0xF4, 0b001_001_11),
            write_reg(0xF4, 0b001_001_01),
            read_reg(0xF5, 0b101_100_00),
            read_reg(0xF5, 0b101_100_00),
            read_reg(0xF5, 0b101_100_00),
            write_reg(0xF5, 0b110_100_00),
            read_reg(0xF5, 0b110_100_00),
            write_reg(0xF5, 0b110_010_00),
            read_reg(0xF3, 0b0000_1001),
        ];
        let (mut bme, mut i2c) = new_device(&expectations);
        assert_eq!(bme.power_mode().unwrap(), PowerMode::Forced);
        bme.set_power_mode(PowerMode::Forced).unwrap();
        assert_eq!(bme.standby_time().unwrap(), StandbyTime::Ms1000);
        assert_eq!(bme.filter().unwrap(), Filter::X16);
        bme.set_standby_time(StandbyTime::Ms10).unwrap();
        bme.set_filter(Filter::X4).unwrap();
        assert!(bme.is_measuring().unwrap());
        i2c.done();
    }

    #[test]
    fn secondary_address() {
        let i2c = I2cMock::new(&[Transaction::write_read(0x77, vec![0xD0], vec![0x60])]);
        let mut bme = Bme280::new(i2c, NoopDelay::new(), I2cAddr::Secondary);
        assert_eq!(bme.chip_id().unwrap(), CHIP_ID);
        let (mut i2c, _) = bme.release();
        i2c.done();
    }
}
