use crate::pack::PackIndexMap;




/**
 * Slot indexes of the physical variables in a pack. The lookup by name
 * happens once, here; kernels then address variables by these small integer
 * slots. A slot of -1 means the variable is not in the pack.
 *
 * Primitive and conserved packs are laid out independently, so a map has to
 * be built for each of them.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarMap {
    pub rho: i8,
    pub uu: i8,
    pub u1: i8,
    pub u2: i8,
    pub u3: i8,
    pub b1: i8,
    pub b2: i8,
    pub b3: i8,

    // Floor and passive trackers
    pub rho_added: i8,
    pub uu_added: i8,
    pub passive: i8,

    // Electron entropies
    pub ktot: i8,
    pub k_constant: i8,
    pub k_howes: i8,
    pub k_kawazura: i8,
    pub k_werner: i8,
    pub k_rowan: i8,
    pub k_sharma: i8,

    // Constraint damping and extended MHD
    pub psi: i8,
    pub q: i8,
    pub dp: i8,
}




// ============================================================================
impl VarMap {

    pub fn new(map: &PackIndexMap, is_cons: bool) -> Self {
        let prefix = if is_cons { "cons" } else { "prims" };
        let slot = |name: &str| -> i8 {
            map.get(&format!("{}.{}", prefix, name))
                .map_or(-1, |(s, _)| s as i8)
        };
        let component = |first: i8, n: i8| if first >= 0 { first + n } else { -1 };

        let u1 = slot("uvec");
        let b1 = slot("B");

        Self {
            rho: slot("rho"),
            uu: slot("u"),
            u1,
            u2: component(u1, 1),
            u3: component(u1, 2),
            b1,
            b2: component(b1, 1),
            b3: component(b1, 2),
            rho_added: slot("rho_added"),
            uu_added: slot("u_added"),
            passive: slot("passive"),
            ktot: slot("Ktot"),
            k_constant: slot("Kel_Constant"),
            k_howes: slot("Kel_Howes"),
            k_kawazura: slot("Kel_Kawazura"),
            k_werner: slot("Kel_Werner"),
            k_rowan: slot("Kel_Rowan"),
            k_sharma: slot("Kel_Sharma"),
            psi: slot("psi_cd"),
            q: slot("q"),
            dp: slot("dP"),
        }
    }

    pub fn has_b(&self) -> bool {
        self.b1 >= 0
    }

    pub fn has_emhd(&self) -> bool {
        self.q >= 0 && self.dp >= 0
    }

    /**
     * Slots of scalars carried with the mass flux (their flux is the mass
     * flux times the primitive value).
     */
    pub fn specific_scalars(&self) -> impl Iterator<Item = i8> {
        [
            self.passive,
            self.ktot,
            self.k_constant,
            self.k_howes,
            self.k_kawazura,
            self.k_werner,
            self.k_rowan,
            self.k_sharma,
        ]
        .into_iter()
        .filter(|&s| s >= 0)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::VarMap;
    use crate::pack::PackBuilder;

    #[test]
    fn absent_variables_map_to_minus_one() {
        let map = PackBuilder::new()
            .scalar("prims.rho")
            .scalar("prims.u")
            .vector("prims.uvec")
            .build();
        let m = VarMap::new(&map, false);
        assert_eq!((m.rho, m.uu, m.u1, m.u2, m.u3), (0, 1, 2, 3, 4));
        assert_eq!((m.b1, m.b2, m.b3), (-1, -1, -1));
        assert_eq!(m.ktot, -1);
        assert!(!m.has_b());
    }

    #[test]
    fn cons_and_prims_maps_differ() {
        let prims = PackBuilder::new().scalar("prims.rho").vector("prims.B").build();
        let cons = PackBuilder::new().vector("cons.B").scalar("cons.rho").scalar("cons.Ktot").build();
        let m_p = VarMap::new(&prims, false);
        let m_u = VarMap::new(&cons, true);
        assert_eq!(m_p.b1, 1);
        assert_eq!(m_u.b1, 0);
        assert_eq!(m_u.b3, 2);
        assert_eq!(m_u.rho, 3);
        assert_eq!(m_u.specific_scalars().collect::<Vec<_>>(), vec![4]);
        assert_eq!(VarMap::new(&cons, false).rho, -1);
    }
}
