//! Property tests for merging, weights, the active chain and stale handles

use proptest::prelude::*;

use tw_core::object::{FreeFlags, ObjectRef};
use tw_core::{Flag, ObjectId, ObjectType, World};

#[derive(Debug, Clone)]
struct Shape {
    type_: u8,
    nrof: u32,
    weight: i32,
    named: bool,
    applied: bool,
    identified: bool,
    mark: Option<u8>,
}

fn shape() -> impl Strategy<Value = Shape> {
    (0u8..2, 0u32..4, 1i32..3, any::<bool>(), any::<bool>(), any::<bool>(), proptest::option::of(0u8..2)).prop_map(
        |(type_, nrof, weight, named, applied, identified, mark)| Shape {
            type_,
            nrof,
            weight,
            named,
            applied,
            identified,
            mark,
        },
    )
}

fn build(world: &mut World, s: &Shape) -> ObjectId {
    let id = world.object_new();
    let name = s.named.then(|| world.strings.intern("thing"));
    {
        let ob = world.obj_mut(id);
        ob.type_ = if s.type_ == 0 { ObjectType::Gem } else { ObjectType::Scroll };
        ob.nrof = s.nrof;
        ob.weight = s.weight;
        ob.name = name;
        ob.flags.set(Flag::Applied, s.applied);
        ob.flags.set(Flag::Identified, s.identified);
    }
    if let Some(m) = s.mark {
        world.set_value(id, "mark", Some(&m.to_string()), true);
    }
    id
}

proptest! {
    #[test]
    fn merge_is_symmetric(a in shape(), b in shape()) {
        let mut world = World::with_seed(1);
        let (x, y) = (build(&mut world, &a), build(&mut world, &b));
        let forward = world.can_merge(x, y);
        let backward = world.can_merge(y, x);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn merge_never_overflows(n1 in 1u32..=u32::MAX / 2 + 1, n2 in 1u32..=u32::MAX / 2 + 1) {
        let mut world = World::with_seed(2);
        let s = Shape { type_: 0, nrof: 0, weight: 1, named: false, applied: false, identified: false, mark: None };
        let (x, y) = (build(&mut world, &s), build(&mut world, &s));
        world.obj_mut(x).nrof = n1;
        world.obj_mut(y).nrof = n2;
        let fits = u64::from(n1) + u64::from(n2) < 1u64 << 31;
        prop_assert_eq!(world.can_merge(x, y), fits);
    }

    #[test]
    fn merge_conserves_quantity(n1 in 1u32..1000, n2 in 1u32..1000) {
        let mut world = World::with_seed(3);
        let s = Shape { type_: 0, nrof: 1, weight: 2, named: true, applied: false, identified: false, mark: None };
        let bag = world.object_new();
        let (x, y) = (build(&mut world, &s), build(&mut world, &s));
        world.obj_mut(x).nrof = n1;
        world.obj_mut(y).nrof = n2;
        let kept = world.insert_in_container(x, bag).unwrap();
        let tag = world.obj(y).count;
        let merged = world.insert_in_container(y, bag).unwrap();
        prop_assert_eq!(merged, kept);
        prop_assert!(!world.is_valid(y, tag));
        prop_assert_eq!(world.obj(kept).nrof, n1 + n2);
        prop_assert_eq!(i64::from(world.obj(bag).carrying), 2 * i64::from(n1 + n2));
    }

    #[test]
    fn weight_tracks_recomputation(ops in proptest::collection::vec((0usize..3, 1i32..20, 1u32..4, any::<bool>()), 1..40)) {
        let mut world = World::with_seed(4);
        let mut boxes = Vec::new();
        for _ in 0..3 {
            let b = world.object_new();
            world.obj_mut(b).type_ = ObjectType::Container;
            boxes.push(b);
        }
        world.insert_in_container(boxes[2], boxes[1]).unwrap();
        world.insert_in_container(boxes[1], boxes[0]).unwrap();

        let mut items: Vec<ObjectId> = Vec::new();
        for (target, weight, nrof, take_out) in ops {
            if take_out && !items.is_empty() {
                let victim = items.swap_remove(target % items.len());
                world.remove(victim).unwrap();
                world.free(victim, FreeFlags::empty()).unwrap();
            } else {
                let item = world.object_new();
                world.obj_mut(item).weight = weight;
                world.obj_mut(item).nrof = nrof;
                let kept = world.insert_in_container(item, boxes[target]).unwrap();
                if !items.contains(&kept) {
                    items.push(kept);
                }
            }
        }

        let incremental: Vec<i32> = boxes.iter().map(|&b| world.obj(b).carrying).collect();
        world.sum_weight(boxes[0]);
        let recomputed: Vec<i32> = boxes.iter().map(|&b| world.obj(b).carrying).collect();
        prop_assert_eq!(incremental, recomputed);
        prop_assert_eq!(world.check_integrity(), Ok(()));
    }

    #[test]
    fn active_chain_follows_speed(speeds in proptest::collection::vec((0usize..6, -2.0f32..2.0), 1..60)) {
        let mut world = World::with_seed(5);
        let obs: Vec<ObjectId> = (0..6).map(|_| world.object_new()).collect();
        for (i, speed) in speeds {
            world.set_speed(obs[i], speed);
        }
        let min = world.settings.min_active_speed;
        let expected = obs.iter().filter(|&&o| world.obj(o).speed.abs() > min).count();
        prop_assert_eq!(world.objects.count_active(), expected);
        for &o in &obs {
            let member = world.objects.active().any(|a| a == o);
            prop_assert_eq!(member, world.obj(o).speed.abs() > min);
        }
        prop_assert_eq!(world.check_integrity(), Ok(()));
    }

    #[test]
    fn stale_handles_never_alias(rounds in 1usize..20) {
        let mut world = World::with_seed(6);
        let hunter = world.object_new();
        for _ in 0..rounds {
            let prey = world.object_new();
            world.set_owner(hunter, Some(prey)).unwrap();
            let old = ObjectRef { id: prey, tag: world.obj(prey).count };
            world.free(prey, FreeFlags::empty()).unwrap();

            let fresh = world.object_new();
            prop_assert_eq!(fresh, prey);
            prop_assert_eq!(world.resolve(old), None);
            prop_assert_eq!(world.get_owner(hunter), None);
            world.free(fresh, FreeFlags::empty()).unwrap();
        }
    }
}

#[test]
fn setting_a_key_twice_keeps_one_entry() {
    let mut world = World::with_seed(7);
    let ob = world.object_new();
    world.set_value(ob, "mood", Some("calm"), true);
    world.set_value(ob, "mood", Some("calm"), true);
    assert_eq!(world.obj(ob).key_values.len(), 1);
}
