use crate::{drive::DriveController, hc_sr04::RangeSensor, link::CommandLink};

use super::SmartCar;

#[derive(Default)]
pub struct NoDrive;
pub struct Drive<P, PC>(DriveController<P, PC>);

#[derive(Default)]
pub struct NoLink;
pub struct Link<'a, TX, C>(CommandLink<'a, TX, C>);

#[derive(Default)]
pub struct NoRangeSensor;
pub struct Sensor<'a, TRIG, D, C>(RangeSensor<'a, TRIG, D, C>);

#[derive(Default)]
pub struct Builder<Drive, Link, Sensor> {
    drive: Drive,
    link: Link,
    sensor: Sensor,
}

impl<L, S> Builder<NoDrive, L, S> {
    pub fn drive<P, PC>(self, drive: DriveController<P, PC>) -> Builder<Drive<P, PC>, L, S> {
        let Self { link, sensor, .. } = self;
        Builder {
            drive: Drive(drive),
            link,
            sensor,
        }
    }
}

impl<D, S> Builder<D, NoLink, S> {
    pub fn link<'a, TX, C>(self, link: CommandLink<'a, TX, C>) -> Builder<D, Link<'a, TX, C>, S> {
        let Self { drive, sensor, .. } = self;
        Builder {
            drive,
            link: Link(link),
            sensor,
        }
    }
}

impl<D, L> Builder<D, L, NoRangeSensor> {
    pub fn range_sensor<'a, TRIG, DL, C>(
        self,
        sensor: RangeSensor<'a, TRIG, DL, C>,
    ) -> Builder<D, L, Sensor<'a, TRIG, DL, C>> {
        let Self { drive, link, .. } = self;
        Builder {
            drive,
            link,
            sensor: Sensor(sensor),
        }
    }
}

impl<'a, P, PC, TX, C, TRIG, D> Builder<Drive<P, PC>, Link<'a, TX, C>, Sensor<'a, TRIG, D, C>> {
    pub fn build(self) -> SmartCar<'a, P, PC, TX, C, TRIG, D> {
        SmartCar {
            drive: self.drive.0,
            link: self.link.0,
            sensor: self.sensor.0,
            last_command: None,
        }
    }
}
