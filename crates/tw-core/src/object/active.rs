//! Active chain maintenance

use super::obj::ObjectId;
use crate::world::World;

impl World {
    /// Put `op` on the active chain if it moves fast enough, take it off
    /// otherwise. Freed objects are never active.
    pub fn update_speed(&mut self, op: ObjectId) {
        let min_speed = self.settings.min_active_speed;
        let ob = self.obj(op);
        if ob.is_freed() {
            if ob.speed != 0.0 {
                log::error!("Object {} is freed but has speed", ob.display_name());
                self.obj_mut(op).speed = 0.0;
            }
            self.objects.unlink_active(op);
            return;
        }

        if ob.speed.abs() > min_speed {
            self.objects.link_active(op);
        } else {
            self.objects.unlink_active(op);
        }
    }

    /// Take `op` off the active chain regardless of its speed.
    pub fn remove_from_active_list(&mut self, op: ObjectId) {
        self.objects.unlink_active(op);
    }

    pub fn set_speed(&mut self, op: ObjectId, speed: f32) {
        self.obj_mut(op).speed = speed;
        self.update_speed(op);
    }
}

#[cfg(test)]
mod tests {
    use crate::world::World;

    #[test]
    fn test_speed_threshold() {
        let mut world = World::with_seed(7);
        let a = world.object_new();
        world.set_speed(a, 0.5);
        assert!(world.objects.is_active(a));
        world.set_speed(a, 0.000001);
        assert!(!world.objects.is_active(a));
        world.set_speed(a, -0.2);
        assert!(world.objects.is_active(a));
        assert_eq!(world.objects.count_active(), 1);
    }

    #[test]
    fn test_remove_from_active_list() {
        let mut world = World::with_seed(7);
        let a = world.object_new();
        world.set_speed(a, 1.0);
        world.remove_from_active_list(a);
        assert!(!world.objects.is_active(a));
        assert_eq!(world.obj(a).speed, 1.0);
    }
}
