use crate::calibration::Calibration;
use crate::compensation::FineTemperature;
use crate::hw_def::*;
use crate::types::*;

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

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

impl<I2C, Delay, E> AsyncBme280<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: DelayNs,
{
    /// Create a new async BME280 driver instance
    ///
    /// The driver starts uninitialized; call [`Self::init`] before [`Self::read`].
    pub fn new(i2c: I2C, delay: Delay, i2c_addr: I2cAddr) -> Self {
        Self { i2c, delay, i2c_addr, state: DeviceState::default() }
    }

    /// Destroy the driver and return the bus and delay
    pub fn release(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    async fn read_bytes(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c.write_read(self.i2c_addr.as_u8(), &[reg], buf).await.map_err(Error::I2c)?;
        trace!("bme280::async::read_bytes(): reg=0x{:02x} buf={:?}", reg, buf);
        Ok(())
    }

    async fn read_byte(&mut self, reg: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8; 1];
        self.read_bytes(reg, &mut buf).await?;
        Ok(buf[0])
    }

    async fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), Error<E>> {
        trace!("bme280::async::write_byte(): reg=0x{:02x} value=0x{:02x}", reg, value);
        self.i2c.write(self.i2c_addr.as_u8(), &[reg, value]).await.map_err(Error::I2c)
    }

    async fn read_bits(&mut self, field: BitField) -> Result<u8, Error<E>> {
        Ok(field.extract(self.read_byte(field.reg).await?))
    }

    async fn write_bits(&mut self, field: BitField, value: u8) -> Result<(), Error<E>> {
        let reg_value = self.read_byte(field.reg).await?;
        self.write_byte(field.reg, field.insert(reg_value, value)).await
    }

    /// Verify the chip ID, configure ×1 oversampling on all channels in normal mode and load the calibration
    ///
    /// An identity mismatch leaves the driver state untouched. Any later failure leaves the
    /// driver uninitialized, dropping calibration from an earlier `init()`.
    pub async fn init(&mut self) -> Result<(), Error<E>> {
        let chip_id = self.chip_id().await?;
        if chip_id != CHIP_ID {
            warn!("bme280::async::init(): unexpected chip id 0x{:02x}", chip_id);
            return Err(Error::IdentityMismatch(chip_id));
        }

        self.state.reset();
        self.set_pressure_oversampling(Oversampling::X1).await?;
        self.set_temperature_oversampling(Oversampling::X1).await?;
        self.set_humidity_oversampling(Oversampling::X1).await?;
        self.set_power_mode(PowerMode::Normal).await?;

        self.load_calibration().await
    }

    /// Read the chip identity register
    pub async fn chip_id(&mut self) -> Result<u8, Error<E>> {
        self.read_byte(REG_ID).await
    }

    /// Software reset; waits for the device start-up time
    ///
    /// The driver returns to the uninitialized state.
    pub async fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_byte(REG_RESET, SOFT_RESET_MAGIC).await?;
        self.delay.delay_ms(STARTUP_TIME_MS).await;
        self.state.reset();
        Ok(())
    }

    /// Read both calibration blocks and commit them once both reads succeeded
    pub async fn load_calibration(&mut self) -> Result<(), Error<E>> {
        let mut tp = [0u8; CALIB00_LEN];
        let mut h = [0u8; CALIB26_LEN];
        self.read_bytes(REG_CALIB00, &mut tp).await?;
        self.read_bytes(REG_CALIB26, &mut h).await?;
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
    pub async fn read_raw(&mut self) -> Result<RawSample, Error<E>> {
        let mut buf = [0u8; MEASUREMENT_LEN];
        self.read_bytes(REG_PRESS_MSB, &mut buf).await?;
        Ok(RawSample::from_burst(&buf))
    }

    /// Read and compensate temperature, pressure and humidity
    pub async fn read(&mut self) -> Result<Measurement, Error<E>> {
        if !self.state.is_initialized() {
            return Err(Error::Uninitialized);
        }
        let raw = self.read_raw().await?;
        self.state.measurement(&raw)
    }

    /// Whether a conversion is running
    pub async fn is_measuring(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_bits(FIELD_MEASURING).await? != 0)
    }

    /// Get temperature oversampling
    pub async fn temperature_oversampling(&mut self) -> Result<Oversampling, Error<E>> {
        Ok(self.read_bits(FIELD_OSRS_T).await?.into())
    }

    /// Set temperature oversampling
    pub async fn set_temperature_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<E>> {
        self.write_bits(FIELD_OSRS_T, oversampling.bits()).await
    }

    /// Get pressure oversampling
    pub async fn pressure_oversampling(&mut self) -> Result<Oversampling, Error<E>> {
        Ok(self.read_bits(FIELD_OSRS_P).await?.into())
    }

    /// Set pressure oversampling
    pub async fn set_pressure_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<E>> {
        self.write_bits(FIELD_OSRS_P, oversampling.bits()).await
    }

    /// Get humidity oversampling
    pub async fn humidity_oversampling(&mut self) -> Result<Oversampling, Error<E>> {
        Ok(self.read_bits(FIELD_OSRS_H).await?.into())
    }

    /// Set humidity oversampling
    pub async fn set_humidity_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<E>> {
        self.write_bits(FIELD_OSRS_H, oversampling.bits()).await?;
        // ctrl_hum only takes effect after a write to ctrl_meas
        let ctrl_meas = self.read_byte(REG_CTRL_MEAS).await?;
        self.write_byte(REG_CTRL_MEAS, ctrl_meas).await
    }

    /// Get power mode
    pub async fn power_mode(&mut self) -> Result<PowerMode, Error<E>> {
        Ok(self.read_bits(FIELD_MODE).await?.into())
    }

    /// Set power mode
    pub async fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<E>> {
        self.write_bits(FIELD_MODE, mode.bits()).await
    }

    /// Get standby time of normal mode
    pub async fn standby_time(&mut self) -> Result<StandbyTime, Error<E>> {
        Ok(self.read_bits(FIELD_T_SB).await?.into())
    }

    /// Set standby time of normal mode
    pub async fn set_standby_time(&mut self, standby: StandbyTime) -> Result<(), Error<E>> {
        self.write_bits(FIELD_T_SB, standby.bits()).await
    }

    /// Get IIR filter coefficient
    pub async fn filter(&mut self) -> Result<Filter, Error<E>> {
        Ok(self.read_bits(FIELD_FILTER).await?.into())
    }

    /// Set IIR filter coefficient
    pub async fn set_filter(&mut self, filter: Filter) -> Result<(), Error<E>> {
        self.write_bits(FIELD_FILTER, filter.bits()).await
    }
}
