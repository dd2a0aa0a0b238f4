//! Diagnostic dumps
//!
//! The text format lists the fields that differ from a blank object, one
//! `key value` pair per line, closed by `end`. Dumping never fails.

use std::fmt::Write;

use strum::IntoEnumIterator;

use super::flags::Flag;
use super::obj::{Object, ObjectId, ObjectType};
use crate::world::World;

fn push_str(out: &mut String, key: &str, value: &Option<crate::shstr::SharedStr>) {
    if let Some(v) = value {
        let _ = writeln!(out, "{key} {v}");
    }
}

fn push_diff(out: &mut String, ob: &Object) {
    push_str(out, "name", &ob.name);
    push_str(out, "name_pl", &ob.name_pl);
    push_str(out, "title", &ob.title);
    push_str(out, "race", &ob.race);
    push_str(out, "slaying", &ob.slaying);
    push_str(out, "skill", &ob.skill);
    push_str(out, "custom_name", &ob.custom_name);
    if ob.type_ != ObjectType::default() {
        let _ = writeln!(out, "type {}", ob.type_);
    }
    if ob.subtype != 0 {
        let _ = writeln!(out, "subtype {}", ob.subtype);
    }
    if (ob.x, ob.y) != (0, 0) {
        let _ = writeln!(out, "x {}\ny {}", ob.x, ob.y);
    }
    if ob.nrof != 0 {
        let _ = writeln!(out, "nrof {}", ob.nrof);
    }
    if ob.weight != 0 {
        let _ = writeln!(out, "weight {}", ob.weight);
    }
    if ob.carrying != 0 {
        let _ = writeln!(out, "carrying {}", ob.carrying);
    }
    if ob.speed != 0.0 {
        let _ = writeln!(out, "speed {}\nspeed_left {}", ob.speed, ob.speed_left);
    }
    if ob.level != 0 {
        let _ = writeln!(out, "level {}", ob.level);
    }
    if !ob.move_type.is_empty() {
        let _ = writeln!(out, "move_type {:?}", ob.move_type);
    }
    if !ob.move_block.is_empty() {
        let _ = writeln!(out, "move_block {:?}", ob.move_block);
    }
    for flag in Flag::iter().filter(|&f| ob.has(f)) {
        let _ = writeln!(out, "flag {flag}");
    }
    for kv in ob.key_values.iter() {
        match &kv.value {
            Some(v) => {
                let _ = writeln!(out, "{} {v}", kv.key);
            }
            None => {
                let _ = writeln!(out, "{}", kv.key);
            }
        }
    }
}

impl World {
    /// Text dump of `op` for logs. Accepts a missing handle, a handle from
    /// another world, a freed object or one without an archetype.
    pub fn object_dump(&self, op: Option<ObjectId>) -> String {
        let Some(op) = op else {
            return "[NULL pointer]".to_string();
        };
        if !self.objects.contains(op) {
            return format!("[invalid handle {}]", op.0);
        }
        let ob = self.obj(op);
        let mut out = String::new();

        let Some(arch) = ob.arch.as_ref() else {
            let name = ob.name.as_deref().unwrap_or("(null)");
            let _ = writeln!(out, "Object {name}");
            if ob.is_freed() {
                out.push_str("freed\n");
            }
            out.push_str("end\n");
            return out;
        };

        let _ = writeln!(out, "arch {}", arch.name);
        push_diff(&mut out, ob);
        let links = &ob.links;
        for (key, link) in [
            ("more", links.more),
            ("head", links.head),
            ("env", links.env),
            ("inv", links.inv),
        ] {
            if let Some(id) = link.filter(|&id| self.objects.contains(id)) {
                let _ = writeln!(out, "{key} {}", self.obj(id).count.0);
            }
        }
        if let Some(owner) = ob.owner
            && self.objects.contains(owner)
            && self.is_valid(owner, ob.ownercount)
        {
            let _ = writeln!(out, "owner {}", self.obj(owner).count.0);
        }
        out.push_str("end\n");
        out
    }
}
