#![no_main]
use libfuzzer_sys::fuzz_target;
use ms5803::FactoryCalibrationData;

fuzz_target!(|input: ([u16; 8], u32, u32)| {
    let (prom, raw_temperature, raw_pressure) = input;
    let calibration = FactoryCalibrationData::from_prom(prom);
    // The ADC only ever produces 24 bit values.
    let reading = calibration.compensate(raw_temperature & 0x00FF_FFFF, raw_pressure & 0x00FF_FFFF);
    assert_eq!(
        reading,
        calibration.compensate(raw_temperature & 0x00FF_FFFF, raw_pressure & 0x00FF_FFFF)
    );
});
