use rand::{seq::SliceRandom, Rng};
use rand_chacha::ChaCha8Rng;

const PLANET_NAMES: &[&str] = &[
    "Astra", "Zephira", "Orion", "Nova", "Aurora", "Helios", "Lunaris", "Vega", "Nebula",
    "Stellaris", "Celestia", "Cosmos", "Solis", "Equinox", "Zodiac", "Draco", "Galaxa", "Phaeton",
    "Hyperion", "Triton", "Cronus", "Icarus", "Phoebe", "Thanatos", "Arcturus", "Sirius", "Titan",
    "Mira", "Andromeda", "Rigel", "Altair", "Castor", "Pollux", "Lyra", "Sphinx", "Electra",
    "Gaia", "Janus", "Nyx", "Cygnus", "Hercules", "Pegasus", "Callisto", "Europa", "Ganymede",
    "Io", "Perseus", "Cepheus", "Hydra", "Scorpius",
];

const RESOURCES: &[&str] = &[
    "Iron", "Water Ice", "Helium-3", "Silicates", "Rare Earths", "Methane", "Nickel", "Deuterium",
    "Platinum", "Organics", "Titanium", "Crystal Lattice",
];

const HISTORIES: &[&str] = &[
    "Once a thriving world, it faced devastation from a massive asteroid impact that reshaped its landscape.",
    "The site of an ancient civilization known for its advanced technology and intricate art.",
    "A century of war between its two major factions ended long ago; it is a peaceful land now.",
    "Explorers found it centuries ago and its rich resources turned it into a trading hub.",
    "Something in its past boiled the oceans away, leaving vast deserts behind.",
    "Giant creatures once roamed here; their bones stand as a monument to their extinction.",
    "A great scientific discovery made here pushed space travel forward by generations.",
    "A storm has raged across its southern hemisphere for millennia.",
    "A political alliance formed here has shaped interstellar relations ever since.",
    "A barren wasteland in its youth, terraforming turned it into a lush paradise.",
    "The remains of a colossal station still orbit it, relic of a spacefaring past.",
    "Thought uninhabitable until ecosystems were found thriving deep underground.",
    "It hosted the summit that ended the long feud between rival factions.",
    "A prophecy foretold that a great leader would be born on its surface.",
    "A rare mineral discovered here sparked a rush that lasted for decades.",
    "Home to the first university of interstellar knowledge.",
    "Its biosphere is the reference sample for every study of alien life.",
    "A catastrophe remembered as the Great Collapse rewrote its terrain and climate.",
    "The last dragon-like creatures were sighted in its highlands.",
    "Its deep canyons hide the ruins of civilizations nobody has named yet.",
    "Written off as a barren rock until it became a vital mining colony.",
    "Its forests are said to harbour spirits that keep invaders away.",
    "A deep-space anomaly nearby overturned what scientists thought they knew.",
];

/// Planet names in a seeded, shuffled order.
///
/// The pool holds fifty names. Asking for more wraps around, so names repeat
/// once more than fifty planets exist.
#[derive(Clone, Debug)]
pub struct NamePool {
    names: Vec<&'static str>,
}

impl NamePool {
    pub fn shuffled(rng: &mut ChaCha8Rng) -> Self {
        let mut names = PLANET_NAMES.to_vec();
        names.shuffle(rng);
        Self { names }
    }

    pub fn name(&self, index: usize) -> &'static str {
        self.names[index % self.names.len()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

fn pick<'a>(rng: &mut ChaCha8Rng, options: &'a [&str]) -> &'a str {
    let idx = rng.gen_range(0..options.len());
    options[idx]
}

pub fn random_resource(rng: &mut ChaCha8Rng) -> &'static str {
    pick(rng, RESOURCES)
}

pub fn random_history(rng: &mut ChaCha8Rng) -> &'static str {
    pick(rng, HISTORIES)
}

pub fn roman_numeral(idx: usize) -> &'static str {
    const NUMS: &[&str] = &["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];
    NUMS.get(idx).copied().unwrap_or("X")
}

pub fn moon_name(planet: &str, idx: usize) -> String {
    format!("{} {}", planet, roman_numeral(idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn pool_is_a_permutation_of_fifty_names() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pool = NamePool::shuffled(&mut rng);
        let unique: HashSet<_> = (0..pool.len()).map(|i| pool.name(i)).collect();
        assert_eq!(pool.len(), 50);
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn pool_wraps_past_its_end() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pool = NamePool::shuffled(&mut rng);
        assert_eq!(pool.name(0), pool.name(50));
        assert_eq!(pool.name(7), pool.name(107));
    }

    #[test]
    fn shuffle_is_seeded() {
        let a = NamePool::shuffled(&mut ChaCha8Rng::seed_from_u64(11));
        let b = NamePool::shuffled(&mut ChaCha8Rng::seed_from_u64(11));
        let c = NamePool::shuffled(&mut ChaCha8Rng::seed_from_u64(12));
        let order = |p: &NamePool| (0..p.len()).map(|i| p.name(i)).collect::<Vec<_>>();
        assert_eq!(order(&a), order(&b));
        assert_ne!(order(&a), order(&c));
    }

    #[test]
    fn moons_are_numbered_after_their_planet() {
        assert_eq!(moon_name("Vega", 0), "Vega I");
        assert_eq!(moon_name("Vega", 3), "Vega IV");
        assert_eq!(moon_name("Vega", 40), "Vega X");
    }
}
