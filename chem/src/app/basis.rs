use crate::config::Config;
use crate::io::fetch_basis;
use ::basis::basis::AOBasis;
use ::basis::cgto::NwchemBasis;
use color_eyre::eyre::Result;
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;
use std::marker::PhantomData;

pub type BasisMap<B> = HashMap<&'static str, &'static B>;

/// Loader that can be implemented for any atomic-orbital basis family.
pub trait BasisLoader<B: AOBasis> {
    fn load(&self, element: &Element, basis_name: &str) -> Result<B>;
}

/// Loader backed by NWChem-format basis files (local directory first, then
/// the Basis Set Exchange).
pub struct NwchemLoader {
    pub basis_dir: Option<String>,
}

impl BasisLoader<NwchemBasis> for NwchemLoader {
    fn load(&self, element: &Element, basis_name: &str) -> Result<NwchemBasis> {
        fetch_basis(element.get_symbol(), basis_name, self.basis_dir.as_deref())
    }
}

/// Registry that caches one loaded basis per element. Loaded sets are
/// leaked to get the stable 'static references the SCF layer holds on to.
pub struct BasisRegistry<B: AOBasis + 'static, L: BasisLoader<B>> {
    loader: L,
    cache: BasisMap<B>,
    _marker: PhantomData<B>,
}

impl<B: AOBasis + 'static, L: BasisLoader<B>> BasisRegistry<B, L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: HashMap::new(),
            _marker: PhantomData,
        }
    }

    pub fn load_for_elements(
        &mut self,
        config: &Config,
        elements: &[Element],
    ) -> Result<BasisMap<B>> {
        for element in elements {
            let symbol = element.get_symbol();
            if self.cache.contains_key(symbol) {
                continue;
            }

            // per-element override wins over the global basis name
            let basis_name = config
                .basis_sets
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| config.basis_name());

            let basis = self.loader.load(element, &basis_name)?;
            let leaked: &'static B = Box::leak(Box::new(basis));
            self.cache.insert(symbol, leaked);
        }

        Ok(self.cache.clone())
    }
}
