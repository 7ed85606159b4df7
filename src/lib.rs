//! # Getting started
//!
//! A platform agnostic driver for the MS5803 family of pressure sensors from
//! TE Connectivity (Measurement Specialties).
//!
//! This driver supports reading the factory calibration PROM and the
//! temperature/pressure from the on-chip ADC, and applies the second order
//! compensation from the datasheet to produce calibrated readings.
//!
//! ## Example
//! ```rust
//! # // NOTE: Use real i2c instance for your app.
//! # use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//! # let i2c = I2cMock::new(&[I2cTransaction::write(0x76, vec![0x1E]),
//! #     I2cTransaction::write(0x76, vec![0xA0]), I2cTransaction::read(0x76, vec![0x00, 0x00]),
//! #     I2cTransaction::write(0x76, vec![0xA2]), I2cTransaction::read(0x76, vec![0xB5, 0x24]),
//! #     I2cTransaction::write(0x76, vec![0xA4]), I2cTransaction::read(0x76, vec![0xAB, 0xCD]),
//! #     I2cTransaction::write(0x76, vec![0xA6]), I2cTransaction::read(0x76, vec![0x71, 0x83]),
//! #     I2cTransaction::write(0x76, vec![0xA8]), I2cTransaction::read(0x76, vec![0x6C, 0xC2]),
//! #     I2cTransaction::write(0x76, vec![0xAA]), I2cTransaction::read(0x76, vec![0x7B, 0x41]),
//! #     I2cTransaction::write(0x76, vec![0xAC]), I2cTransaction::read(0x76, vec![0x6E, 0x05]),
//! #     I2cTransaction::write(0x76, vec![0xAE]), I2cTransaction::read(0x76, vec![0x00, 0x08]),
//! #     I2cTransaction::write(0x76, vec![0x58]),
//! #     I2cTransaction::write(0x76, vec![0x00]), I2cTransaction::read(0x76, vec![0x7F, 0xFA, 0xE4]),
//! #     I2cTransaction::write(0x76, vec![0x48]),
//! #     I2cTransaction::write(0x76, vec![0x00]), I2cTransaction::read(0x76, vec![0x41, 0xC9, 0xFE]),
//! # ]);
//! use ms5803::{Address, OverSamplingRatio, mock_utils::SleepNop};
//! // NOTE: You should implement the DelayMs trait for this driver to work
//! // correctly.
//! let pressure_sensor = ms5803::new(i2c, SleepNop, Address::High);
//! let mut pressure_sensor = pressure_sensor.init().unwrap();
//! println!(
//!     "{:?}",
//!     pressure_sensor
//!         .read_temperature_and_pressure(OverSamplingRatio::R4096)
//!         .unwrap()
//! );
//! ```
//!
//! ## Binding the bus
//!
//! A driver can also be described by its address alone and bound to a bus
//! later. No bus operation exists until the bus is bound:
//!
//! ```compile_fail
//! use ms5803::{Address, Channel, OverSamplingRatio, Unbound};
//! let mut sensor = Unbound::new(Address::Low);
//! sensor.convert(Channel::Pressure, OverSamplingRatio::R256);
//! ```
//!
//! ## Features
//!
//! - `defmt`: derives `defmt::Format` for the public types and logs bus
//!   activity through `defmt`.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
mod fmt;

use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Read, Write},
};


/// Mock utils is a set of tools to aid in testing and documenting you should not
/// use any of the mocks defined in this module in your release binaries.
pub mod mock_utils {
    /// A sleep implementation that does nothing and immediately exits. This is
    /// useful for testing and fuzzing.
    pub struct SleepNop;

    impl embedded_hal::blocking::delay::DelayMs<u32> for SleepNop {
        fn delay_ms(&mut self, _ms: u32) {
            // Nop
        }
    }
}


/// Generates a 4bit cyclic redundancy check over the PROM as described in the
/// application note.
///
/// The low byte of word 7 holds the crc itself and is treated as zero.
fn crc4(prom: &[u16; PROM_WORDS]) -> u8 {
    let mut n_remainder: u16 = 0;
    let mut words = *prom;
    words[PROM_WORDS - 1] &= 0xFF00;
    for byte in words.iter().flat_map(|word| word.to_be_bytes()) {
        n_remainder ^= byte as u16;
        for _ in 0..8 {
            if n_remainder & 0x8000 != 0 {
                n_remainder = (n_remainder << 1) ^ 0x3000;
            } else {
                n_remainder <<= 1;
            }
        }
    }
    ((n_remainder >> 12) & 0x000F) as u8
}

/// A catch all error for this driver
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    PromCrcMismatch {
        got: u8,
        expected: u8,
    },
    /// The ADC answered with zero. The device does this when it is read
    /// before a conversion finished or without a conversion being started.
    ConversionIncomplete(Channel),
    I2cError(E),
}

const RESET_SETTLE_MS: u32 = 3;
const CONVERSION_LEAD_IN_MS: u32 = 1;
const PROM_WORDS: usize = 8;

/// The 7 bit bus address, selected by the CSB pin.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// CSB pulled high.
    #[default]
    High = 0x76,
    /// CSB pulled low.
    Low = 0x77,
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address as u8
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Implemented by each stage of the driver lifecycle.
pub trait State: sealed::Sealed {
    /// The bus address the driver talks to.
    fn address(&self) -> Address;
}

pub trait I2cMarker: Read + Write
where
    Self: Write<Error = <Self as Read>::Error>,
{
}
impl<T: Read + Write> I2cMarker for T where Self: Write<Error = <Self as Read>::Error> {}

/// Create an uninitialised driver object
///
/// # Example
///
/// ```
/// // NOTE: Use real i2c instance for your app.
/// use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
/// use ms5803::{Address, mock_utils::SleepNop};
/// // NOTE: You should implement the DelayMs trait for this driver to work
/// // correctly.
/// let i2c = I2cMock::new(&[]);
/// let pressure_sensor = ms5803::new(i2c, SleepNop, Address::High);
/// ```
pub fn new<I2C: I2cMarker, D: DelayMs<u32>>(
    i2c: I2C,
    sleep: D,
    address: Address,
) -> Uninitialised<I2C, D> {
    Uninitialised {
        bus: Bus {
            i2c,
            sleep,
            address,
        },
    }
}

/// The measurement channel of the ADC.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Digital pressure value, D1.
    Pressure = 0x00,
    /// Digital temperature value, D2.
    Temperature = 0x10,
}

/// The oversampling ratio to use internal to the ADC. This is analogous to taking
/// n samples and then taking the average.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverSamplingRatio {
    R256 = 0x0,
    R512 = 0x2,
    R1024 = 0x4,
    R2048 = 0x6,
    R4096 = 0x8,
}

impl OverSamplingRatio {
    /// Worst case conversion time from the datasheet, rounded up to whole
    /// milliseconds.
    pub fn conversion_time_ms(&self) -> u32 {
        use OverSamplingRatio::*;
        match *self {
            R256 => 1,
            R512 => 3,
            R1024 => 4,
            R2048 => 6,
            R4096 => 10,
        }
    }
}

/// Unit for temperatures handed out by the driver.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Converts hundredths of a degree Celsius into this unit.
    pub fn convert(self, centidegrees: i32) -> f32 {
        let celsius = centidegrees as f32 / 100.0;
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

/// The factory calibration data as fetched from the PROM.
///
/// Word 0 is reserved by the manufacturer, words 1 to 6 are the coefficients
/// C1 to C6 and the low nibble of word 7 holds the CRC.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FactoryCalibrationData {
    prom: [u16; PROM_WORDS],
}

impl FactoryCalibrationData {
    /// Wraps a PROM image in read order.
    pub const fn from_prom(prom: [u16; PROM_WORDS]) -> Self {
        Self { prom }
    }

    /// All eight PROM words in read order.
    pub fn coefficients(&self) -> &[u16; PROM_WORDS] {
        &self.prom
    }

    /// Pressure sensitivity, C1.
    pub fn pressure_sensitivity(&self) -> u16 {
        self.prom[1]
    }

    /// Pressure offset, C2.
    pub fn pressure_offset(&self) -> u16 {
        self.prom[2]
    }

    /// Temperature coefficient of pressure sensitivity, C3.
    pub fn temperature_coefficient_of_pressure_sensitivity(&self) -> u16 {
        self.prom[3]
    }

    /// Temperature coefficient of pressure offset, C4.
    pub fn temperature_coefficient_of_pressure_offset(&self) -> u16 {
        self.prom[4]
    }

    /// Reference temperature, C5.
    pub fn reference_temperature(&self) -> u16 {
        self.prom[5]
    }

    /// Temperature coefficient of the temperature, C6.
    pub fn temperature_coefficient_of_temperature(&self) -> u16 {
        self.prom[6]
    }

    /// The CRC stored alongside the coefficients.
    pub fn crc(&self) -> u8 {
        (self.prom[PROM_WORDS - 1] & 0x000F) as u8
    }

    /// Checks the stored CRC against one computed over the PROM contents.
    pub fn verify_crc<E>(&self) -> Result<(), SensorError<E>> {
        let expected = self.crc();
        let got = crc4(&self.prom);
        if expected != got {
            warn!("ms5803: PROM crc mismatch, got {}, expected {}", got, expected);
            return Err(SensorError::PromCrcMismatch { got, expected });
        }
        Ok(())
    }

    /// Applies first and second order compensation to a pair of raw ADC
    /// readings.
    ///
    /// Follows the integer formula from the datasheet step for step. Every
    /// intermediate is an `i64`, so no combination of 24 bit readings and 16
    /// bit coefficients can overflow.
    pub fn compensate(&self, raw_temperature: u32, raw_pressure: u32) -> CompensatedReading {
        let adc_temperature = i64::from(raw_temperature);
        let adc_pressure = i64::from(raw_pressure);
        let pressure_sensitivity = i64::from(self.pressure_sensitivity());
        let pressure_offset = i64::from(self.pressure_offset());
        let temperature_coefficient_of_pressure_sensitivity =
            i64::from(self.temperature_coefficient_of_pressure_sensitivity());
        let temperature_coefficient_of_pressure_offset =
            i64::from(self.temperature_coefficient_of_pressure_offset());
        let reference_temperature = i64::from(self.reference_temperature());
        let temperature_coefficient_of_temperature =
            i64::from(self.temperature_coefficient_of_temperature());

        let dt = adc_temperature - (reference_temperature << 8);

        // Actual temperature = 2000 + dT * TEMPSENS
        let temperature = ((dt * temperature_coefficient_of_temperature) >> 23) + 2000;

        let SecondOrder {
            t2,
            offset2,
            sensitivity2,
        } = SecondOrder::new(dt, temperature);

        // OFF = OFF_T1 + TCO * dT
        let offset = (pressure_offset << 16)
            + ((temperature_coefficient_of_pressure_offset * dt) >> 7)
            - offset2;

        // Sensitivity at actual temperature = SENS_T1 + TCS * dT
        let sensitivity = (pressure_sensitivity << 15)
            + ((temperature_coefficient_of_pressure_sensitivity * dt) >> 8)
            - sensitivity2;

        // Temperature compensated pressure = D1 * SENS - OFF. Each division
        // truncates towards zero.
        let pressure = (((adc_pressure * sensitivity) / 2_097_152) - offset) / 32_768;

        CompensatedReading {
            temperature: (temperature - t2) as i32,
            pressure: pressure as i32,
        }
    }
}

/// Second order correction terms.
#[derive(Debug, PartialEq)]
struct SecondOrder {
    t2: i64,
    offset2: i64,
    sensitivity2: i64,
}

impl SecondOrder {
    fn new(dt: i64, temperature: i64) -> Self {
        if temperature < 2000 {
            let low_temperature = (temperature - 2000).pow(2);
            let mut offset2 = 3 * low_temperature / 2;
            let mut sensitivity2 = 5 * low_temperature / 8;

            if temperature < -1500 {
                let very_low_temperature = (temperature + 1500).pow(2);
                offset2 += 7 * very_low_temperature;
                sensitivity2 += 4 * very_low_temperature;
            }

            SecondOrder {
                t2: 3 * (dt.pow(2) >> 33),
                offset2,
                sensitivity2,
            }
        } else {
            SecondOrder {
                t2: 7 * dt.pow(2) / (1i64 << 37),
                offset2: (temperature - 2000).pow(2) / 16,
                sensitivity2: 0,
            }
        }
    }
}

/// A compensated reading in the sensor's fixed point units.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedReading {
    /// Hundredths of a degree Celsius.
    pub temperature: i32,
    /// Tenths of a millibar.
    pub pressure: i32,
}

impl CompensatedReading {
    pub fn celsius(&self) -> f32 {
        TemperatureUnit::Celsius.convert(self.temperature)
    }

    pub fn fahrenheit(&self) -> f32 {
        TemperatureUnit::Fahrenheit.convert(self.temperature)
    }

    pub fn temperature_in(&self, unit: TemperatureUnit) -> f32 {
        unit.convert(self.temperature)
    }

    pub fn millibar(&self) -> f32 {
        self.pressure as f32 / 10.0
    }
}

/// An I2C command to send to the pressure sensor.
enum Command {
    Reset,
    Convert(Channel, OverSamplingRatio),
    AdcRead,
    PromRead(u8),
}

/// Convert the command into a single byte that can be sent over i2c.
impl From<Command> for u8 {
    fn from(val: Command) -> u8 {
        use Command::*;
        match val {
            Reset => 0x1E,
            Convert(channel, osr) => 0x40u8 + channel as u8 + osr as u8,
            AdcRead => 0x00,
            PromRead(index) => 0xA0u8 + index * 2,
        }
    }
}

/// The bus handle shared by the bound states.
struct Bus<I2C, D> {
    i2c: I2C,
    sleep: D,
    address: Address,
}

impl<I2C: I2cMarker, D: DelayMs<u32>> Bus<I2C, D> {
    fn send(&mut self, command: Command) -> Result<(), SensorError<<I2C as Read>::Error>> {
        self.i2c
            .write(self.address.into(), &[command.into()])
            .map_err(SensorError::I2cError)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<(), SensorError<<I2C as Read>::Error>> {
        self.i2c
            .read(self.address.into(), buffer)
            .map_err(SensorError::I2cError)
    }

    /// Reset the ms5803 internal state machine, reloading the PROM into the
    /// device's internal registers.
    fn reset(&mut self) -> Result<(), SensorError<<I2C as Read>::Error>> {
        debug!("ms5803: reset");
        self.send(Command::Reset)?;
        self.sleep.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Read the contents of the PROM.
    fn read_prom(&mut self) -> Result<[u16; PROM_WORDS], SensorError<<I2C as Read>::Error>> {
        let mut prom = [0u16; PROM_WORDS];
        for (index, entry) in (0u8..).zip(prom.iter_mut()) {
            let mut buffer = [0, 0];
            self.send(Command::PromRead(index))?;
            self.receive(&mut buffer)?;
            *entry = u16::from_be_bytes(buffer);
            trace!("ms5803: PROM[{}] = {}", index, *entry);
        }
        Ok(prom)
    }

    // Starts a conversion and reads the raw result back from the sensor.
    fn convert(
        &mut self,
        channel: Channel,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<u32, SensorError<<I2C as Read>::Error>> {
        let mut raw_buffer = [0u8; 4];
        self.send(Command::Convert(channel, over_sampling_ratio))?;
        self.sleep.delay_ms(CONVERSION_LEAD_IN_MS);
        self.sleep
            .delay_ms(over_sampling_ratio.conversion_time_ms());
        self.send(Command::AdcRead)?;
        // ADC is 24bit but we are storing in u32.
        self.receive(&mut raw_buffer[1..])?;
        let raw = u32::from_be_bytes(raw_buffer);
        if raw == 0 {
            warn!("ms5803: {} conversion returned no data", channel);
            return Err(SensorError::ConversionIncomplete(channel));
        }
        trace!("ms5803: {} raw = {}", channel, raw);
        Ok(raw)
    }
}

/// A driver that knows its address but has no bus yet.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Unbound {
    address: Address,
}

impl State for Unbound {
    fn address(&self) -> Address {
        self.address
    }
}
impl sealed::Sealed for Unbound {}

impl Unbound {
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    /// Binds the bus and delay, leaving the sensor uninitialised.
    pub fn bind<I2C: I2cMarker, D: DelayMs<u32>>(
        self,
        i2c: I2C,
        sleep: D,
    ) -> Uninitialised<I2C, D> {
        new(i2c, sleep, self.address)
    }

    /// Binds the bus and delay and initialises the sensor.
    ///
    /// Uses the address given to [`Unbound::new`]; see [`Unbound::begin_at`]
    /// to pick the address at this point instead.
    ///
    /// # Errors
    /// See [`Uninitialised::init`].
    pub fn begin<I2C: I2cMarker, D: DelayMs<u32>>(
        self,
        i2c: I2C,
        sleep: D,
    ) -> Result<Initialised<I2C, D>, SensorError<<I2C as Read>::Error>> {
        self.bind(i2c, sleep).init()
    }

    /// Like [`Unbound::begin`], but talks to the sensor at `address`.
    ///
    /// # Errors
    /// See [`Uninitialised::init`].
    pub fn begin_at<I2C: I2cMarker, D: DelayMs<u32>>(
        self,
        i2c: I2C,
        sleep: D,
        address: Address,
    ) -> Result<Initialised<I2C, D>, SensorError<<I2C as Read>::Error>> {
        Self::new(address).begin(i2c, sleep)
    }
}

/// An uninitialised ms5803 object.
pub struct Uninitialised<I2C: I2cMarker, D: DelayMs<u32>> {
    bus: Bus<I2C, D>,
}

impl<I2C: I2cMarker, D: DelayMs<u32>> State for Uninitialised<I2C, D> {
    fn address(&self) -> Address {
        self.bus.address
    }
}
impl<I2C: I2cMarker, D: DelayMs<u32>> sealed::Sealed for Uninitialised<I2C, D> {}

impl<I2C: I2cMarker, D: DelayMs<u32>> Uninitialised<I2C, D> {
    /// Reset the ms5803 internal state machine and wait for it to settle.
    ///
    /// # Errors
    /// This may return an error if there is a problem with i2c communication.
    pub fn reset(&mut self) -> Result<(), SensorError<<I2C as Read>::Error>> {
        self.bus.reset()
    }

    /// Reads the PROM contents into factory calibration data.
    fn read_calibration_data(
        &mut self,
    ) -> Result<FactoryCalibrationData, SensorError<<I2C as Read>::Error>> {
        Ok(FactoryCalibrationData::from_prom(self.bus.read_prom()?))
    }

    /// Releases the i2c handle consuming the driver object.
    ///
    /// # Example
    ///
    /// ```
    /// // NOTE: Use real i2c instance for your app.
    /// use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    /// // Dummy sleep implementation.
    /// use ms5803::{Address, mock_utils::SleepNop};
    /// let i2c = I2cMock::new(&[]);
    /// let pressure_sensor = ms5803::new(i2c, SleepNop, Address::High);
    /// let i2c = pressure_sensor.release();
    /// ```
    pub fn release(self) -> (I2C, D) {
        (self.bus.i2c, self.bus.sleep)
    }

    /// Initialises the pressure sensor by resetting it and reading the
    /// factory calibration data.
    ///
    /// The PROM CRC is not checked, see [`Uninitialised::init_with_crc_check`].
    /// A sensor that does not answer with real data still initialises with
    /// whatever the bus returned.
    ///
    /// # Errors
    /// Initialisation can fail if there was a problem communicating over i2c.
    ///
    /// # Example
    ///
    /// ```rust
    /// // NOTE: Use real i2c instance for your app.
    /// # use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    /// # let i2c = I2cMock::new(&[I2cTransaction::write(0x77, vec![0x1E]),
    /// #     I2cTransaction::write(0x77, vec![0xA0]), I2cTransaction::read(0x77, vec![0x00, 0x00]),
    /// #     I2cTransaction::write(0x77, vec![0xA2]), I2cTransaction::read(0x77, vec![0xB5, 0x24]),
    /// #     I2cTransaction::write(0x77, vec![0xA4]), I2cTransaction::read(0x77, vec![0xAB, 0xCD]),
    /// #     I2cTransaction::write(0x77, vec![0xA6]), I2cTransaction::read(0x77, vec![0x71, 0x83]),
    /// #     I2cTransaction::write(0x77, vec![0xA8]), I2cTransaction::read(0x77, vec![0x6C, 0xC2]),
    /// #     I2cTransaction::write(0x77, vec![0xAA]), I2cTransaction::read(0x77, vec![0x7B, 0x41]),
    /// #     I2cTransaction::write(0x77, vec![0xAC]), I2cTransaction::read(0x77, vec![0x6E, 0x05]),
    /// #     I2cTransaction::write(0x77, vec![0xAE]), I2cTransaction::read(0x77, vec![0x00, 0x08]),
    /// # ]);
    /// use ms5803::{Address, mock_utils::SleepNop};
    /// let pressure_sensor = ms5803::new(i2c, SleepNop, Address::Low);
    /// let pressure_sensor = pressure_sensor.init();
    /// ```
    pub fn init(mut self) -> Result<Initialised<I2C, D>, SensorError<<I2C as Read>::Error>> {
        self.reset()?;
        let calibration_data = self.read_calibration_data()?;
        debug!("ms5803: initialised at {}", self.bus.address);

        Ok(Initialised {
            bus: self.bus,
            calibration_data,
        })
    }

    /// Like [`Uninitialised::init`], but rejects PROM contents whose CRC does
    /// not match.
    ///
    /// # Errors
    /// Initialisation can fail if;
    /// - There was a problem communicating over i2c.
    /// - There was a crc mismatch when reading factory calibration data off the
    ///   PROM.
    pub fn init_with_crc_check(
        self,
    ) -> Result<Initialised<I2C, D>, SensorError<<I2C as Read>::Error>> {
        let sensor = self.init()?;
        sensor.calibration_data.verify_crc().map(|()| sensor)
    }
}

/// An initialised ms5803 object.
pub struct Initialised<I2C: I2cMarker, D: DelayMs<u32>> {
    bus: Bus<I2C, D>,
    calibration_data: FactoryCalibrationData,
}

impl<I2C: I2cMarker, D: DelayMs<u32>> State for Initialised<I2C, D> {
    fn address(&self) -> Address {
        self.bus.address
    }
}
impl<I2C: I2cMarker, D: DelayMs<u32>> sealed::Sealed for Initialised<I2C, D> {}

/// A group of temperature and pressure samples. These are grouped as pressure
/// normalisation requires sampling the current temperature.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperaturePressure {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Millibar.
    pub pressure: f32,
}

impl From<CompensatedReading> for TemperaturePressure {
    fn from(reading: CompensatedReading) -> Self {
        TemperaturePressure {
            temperature: reading.celsius(),
            pressure: reading.millibar(),
        }
    }
}

impl<I2C: I2cMarker, D: DelayMs<u32>> Initialised<I2C, D> {
    /// Release the i2c handle consuming the driver.
    pub fn release(self) -> (I2C, D) {
        (self.bus.i2c, self.bus.sleep)
    }

    /// The calibration data read at initialisation.
    pub fn calibration(&self) -> &FactoryCalibrationData {
        &self.calibration_data
    }

    /// Resets the sensor and reads the calibration data again.
    ///
    /// The stored calibration data is only replaced once the whole PROM was
    /// read.
    ///
    /// # Errors
    /// This may return an error if there is a problem with i2c communication.
    pub fn reinitialise(&mut self) -> Result<(), SensorError<<I2C as Read>::Error>> {
        self.bus.reset()?;
        let prom = self.bus.read_prom()?;
        self.calibration_data = FactoryCalibrationData::from_prom(prom);
        Ok(())
    }

    /// Starts a conversion on `channel` and reads back the raw 24 bit result.
    ///
    /// # Errors
    /// This may return an error if there is a problem with i2c communication,
    /// or [`SensorError::ConversionIncomplete`] if the ADC answered with zero.
    pub fn convert(
        &mut self,
        channel: Channel,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<u32, SensorError<<I2C as Read>::Error>> {
        self.bus.convert(channel, over_sampling_ratio)
    }

    /// Like [`Initialised::convert`] but yields 0 on any failure.
    pub fn convert_or_zero(
        &mut self,
        channel: Channel,
        over_sampling_ratio: OverSamplingRatio,
    ) -> u32 {
        self.convert(channel, over_sampling_ratio).unwrap_or(0)
    }

    /// Converts temperature then pressure and compensates the pair.
    ///
    /// # Errors
    /// This may return an error if either conversion fails.
    pub fn measure(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<CompensatedReading, SensorError<<I2C as Read>::Error>> {
        // Based on the conversion sequence in the datasheet.
        let temperature = self.convert(Channel::Temperature, over_sampling_ratio)?;
        let pressure = self.convert(Channel::Pressure, over_sampling_ratio)?;

        Ok(self.calibration_data.compensate(temperature, pressure))
    }

    /// Like [`Initialised::measure`], but a failed conversion counts as a raw
    /// reading of 0 and the cycle carries on. The result is then plausible
    /// looking but wrong, so only use this if you check the bus elsewhere.
    pub fn measure_or_zeroed(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> CompensatedReading {
        let temperature = self.convert_or_zero(Channel::Temperature, over_sampling_ratio);
        let pressure = self.convert_or_zero(Channel::Pressure, over_sampling_ratio);

        self.calibration_data.compensate(temperature, pressure)
    }

    /// Reads the temperature and pressure samples from the sensor.
    ///
    /// # Errors
    /// This may return an error if there is a problem with i2c communication.
    ///
    /// # Example
    ///
    /// ```rust
    /// # // NOTE: Use real i2c instance for your app.
    /// # use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    /// # let i2c = I2cMock::new(&[I2cTransaction::write(0x76, vec![0x1E]),
    /// #     I2cTransaction::write(0x76, vec![0xA0]), I2cTransaction::read(0x76, vec![0x00, 0x00]),
    /// #     I2cTransaction::write(0x76, vec![0xA2]), I2cTransaction::read(0x76, vec![0xB5, 0x24]),
    /// #     I2cTransaction::write(0x76, vec![0xA4]), I2cTransaction::read(0x76, vec![0xAB, 0xCD]),
    /// #     I2cTransaction::write(0x76, vec![0xA6]), I2cTransaction::read(0x76, vec![0x71, 0x83]),
    /// #     I2cTransaction::write(0x76, vec![0xA8]), I2cTransaction::read(0x76, vec![0x6C, 0xC2]),
    /// #     I2cTransaction::write(0x76, vec![0xAA]), I2cTransaction::read(0x76, vec![0x7B, 0x41]),
    /// #     I2cTransaction::write(0x76, vec![0xAC]), I2cTransaction::read(0x76, vec![0x6E, 0x05]),
    /// #     I2cTransaction::write(0x76, vec![0xAE]), I2cTransaction::read(0x76, vec![0x00, 0x08]),
    /// #     I2cTransaction::write(0x76, vec![0x58]),
    /// #     I2cTransaction::write(0x76, vec![0x00]), I2cTransaction::read(0x76, vec![0x7F, 0xFA, 0xE4]),
    /// #     I2cTransaction::write(0x76, vec![0x48]),
    /// #     I2cTransaction::write(0x76, vec![0x00]), I2cTransaction::read(0x76, vec![0x41, 0xC9, 0xFE]),
    /// # ]);
    /// use ms5803::{Address, OverSamplingRatio, mock_utils::SleepNop};
    /// let pressure_sensor = ms5803::new(i2c, SleepNop, Address::High);
    /// let mut pressure_sensor = pressure_sensor.init().unwrap();
    /// let reading = pressure_sensor
    ///     .read_temperature_and_pressure(OverSamplingRatio::R4096)
    ///     .unwrap();
    /// assert!((reading.temperature - 30.35).abs() < 0.001);
    /// assert!((reading.pressure - 752.6).abs() < 0.001);
    /// ```
    pub fn read_temperature_and_pressure(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<TemperaturePressure, SensorError<<I2C as Read>::Error>> {
        self.measure(over_sampling_ratio).map(TemperaturePressure::from)
    }

    /// Reads the temperature from the sensor.
    ///
    /// Pressure is converted as well, every call runs a full measurement
    /// cycle.
    ///
    /// # Errors
    /// This may return an error if there is a problem with i2c communication.
    pub fn read_temperature(
        &mut self,
        unit: TemperatureUnit,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<f32, SensorError<<I2C as Read>::Error>> {
        Ok(self.measure(over_sampling_ratio)?.temperature_in(unit))
    }

    /// Reads the pressure from the sensor in millibar.
    ///
    /// Runs a full measurement cycle, temperature included.
    ///
    /// # Errors
    /// This may return an error if there is a problem with i2c communication.
    pub fn read_pressure(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<f32, SensorError<<I2C as Read>::Error>> {
        Ok(self.measure(over_sampling_ratio)?.millibar())
    }
}
