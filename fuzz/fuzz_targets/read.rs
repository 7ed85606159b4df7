#![no_main]
use embedded_hal_fuzz::{i2c::I2cFuzz, shared_data::FuzzData};
use libfuzzer_sys::fuzz_target;
use ms5803::{Address, OverSamplingRatio, TemperatureUnit};

type Error = ();

fuzz_target!(|data: &[u8]| {
    let data = FuzzData::new(data);
    let i2c: I2cFuzz<'_, Error> = I2cFuzz::new(data);
    let pressure_sensor = ms5803::new(i2c, ms5803::mock_utils::SleepNop, Address::High);
    if let Ok(mut pressure_sensor) = pressure_sensor.init() {
        // We ignore the results as they are likely garbage. We don't care about
        // the result/error just if it crashes or not.
        let _ = pressure_sensor.read_temperature_and_pressure(OverSamplingRatio::R4096);
        let _ = pressure_sensor.read_temperature(TemperatureUnit::Fahrenheit, OverSamplingRatio::R256);
        let _ = pressure_sensor.measure_or_zeroed(OverSamplingRatio::R1024);
    }
});
