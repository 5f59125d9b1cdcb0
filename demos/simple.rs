use nalgebra::Vector3;
use navcore::{FusionEngine, GnssReceiver, GnssSettings, ImuSample, MagSample};

const SAMPLE_PERIOD: f32 = 0.1; // 100 ms sample period

fn main() {
    let mut engine = FusionEngine::new();
    let attitude = engine.subscribe();

    for i in 0..10 {
        // this loop should repeat each time new IMU data is available
        let accel = Vector3::new(0.0, 0.0, 9.81); // replace this with actual accelerometer data in m/s²
        let gyro = Vector3::new(0.0, 0.0, 10.0); // replace this with actual gyroscope data in degrees/s
        let field = Vector3::new(20.0, 0.0, -40.0); // replace this with actual magnetometer data in µT

        let imu = ImuSample::new(accel, gyro, i * 100);
        engine.update(Some(&imu), Some(&MagSample::new(field)), SAMPLE_PERIOD);

        let output = attitude.snapshot();
        println!(
            "Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}, Heading: {:.1}, Forward: {:.3} g",
            output.roll, output.pitch, output.yaw, output.heading, output.forward_g
        );
    }

    let mut receiver = GnssReceiver::new(GnssSettings::default());
    let gnss = receiver.subscribe();

    // replace this with bytes read from the receiver's serial port
    receiver.ingest(b"$GPGGA,120000,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*49\r\n", 1000);

    let fix = gnss.snapshot().fix;
    println!(
        "Fix: {}, Satellites: {}, Lat: {:.5}, Lon: {:.5}, Alt: {:.1} m",
        fix.fix_valid, fix.satellites, fix.latitude, fix.longitude, fix.altitude
    );
}
